//! Example schema shared by the workspace test suites.
//!
//! ```text
//! rpc ex:reboot
//!   input:  delay (uint32, default 0)
//!           options { force (boolean, default false), reason (string) }
//!           payload (anydata)
//!           confirm (presence)
//!   output: summary (presence) { detail { timing { elapsed (uint32, default 0),
//!                                                  unit (string, default "ms") } } }
//!           stats { uptime (uint64), restarts (uint32, default 0) }
//!           log [seq] { seq (uint32), msg (string) }
//!           tags (leaf-list of string)
//!           trace (anyxml)
//!
//! container ex:servers
//!   server [name] { name (string), port (uint16, default 830)
//!     action reset
//!       input:  mode (enumeration soft|hard, default soft), delay (uint32)
//!       output: reset-at (string, mandatory)
//!               report { result (string), code (int32, default 0) }
//!               diagnostics (anyxml)
//!   }
//! ```

use std::sync::Arc;

use crate::document::Document;
use crate::error::TreeError;
use crate::insert::InsertOptions;
use crate::node::NodeContent;
use crate::schema::{NodeSpec, Schema};
use crate::types::LeafType;

/// Module name used by the example schema.
pub const MODULE: &str = "ex";

/// Builds the example schema.
///
/// # Errors
///
/// Propagates schema builder failures.
pub fn example_schema() -> Result<Arc<Schema>, TreeError> {
    let mut schema = Schema::new();
    add_reboot(&mut schema)?;
    add_servers(&mut schema)?;
    Ok(Arc::new(schema))
}

fn add_reboot(schema: &mut Schema) -> Result<(), TreeError> {
    let reboot = schema.add_root(MODULE, NodeSpec::rpc("reboot"))?;

    schema.add_input(reboot, NodeSpec::leaf("delay", LeafType::Uint32).with_default("0"))?;
    let options = schema.add_input(reboot, NodeSpec::container("options"))?;
    schema.add_child(
        options,
        NodeSpec::leaf("force", LeafType::Boolean).with_default("false"),
    )?;
    schema.add_child(options, NodeSpec::leaf("reason", LeafType::String))?;
    schema.add_input(reboot, NodeSpec::anydata("payload"))?;
    schema.add_input(reboot, NodeSpec::presence_container("confirm"))?;

    let summary = schema.add_output(reboot, NodeSpec::presence_container("summary"))?;
    let detail = schema.add_child(summary, NodeSpec::container("detail"))?;
    let timing = schema.add_child(detail, NodeSpec::container("timing"))?;
    schema.add_child(
        timing,
        NodeSpec::leaf("elapsed", LeafType::Uint32).with_default("0"),
    )?;
    schema.add_child(timing, NodeSpec::leaf("unit", LeafType::String).with_default("ms"))?;

    let stats = schema.add_output(reboot, NodeSpec::container("stats"))?;
    schema.add_child(stats, NodeSpec::leaf("uptime", LeafType::Uint64))?;
    schema.add_child(
        stats,
        NodeSpec::leaf("restarts", LeafType::Uint32).with_default("0"),
    )?;

    let log = schema.add_output(reboot, NodeSpec::list("log", &["seq"]))?;
    schema.add_child(log, NodeSpec::leaf("seq", LeafType::Uint32))?;
    schema.add_child(log, NodeSpec::leaf("msg", LeafType::String))?;

    schema.add_output(reboot, NodeSpec::leaf_list("tags", LeafType::String))?;
    schema.add_output(reboot, NodeSpec::anyxml("trace"))?;
    Ok(())
}

fn add_servers(schema: &mut Schema) -> Result<(), TreeError> {
    let servers = schema.add_root(MODULE, NodeSpec::container("servers"))?;
    let server = schema.add_child(servers, NodeSpec::list("server", &["name"]))?;
    schema.add_child(server, NodeSpec::leaf("name", LeafType::String))?;
    schema.add_child(server, NodeSpec::leaf("port", LeafType::Uint16).with_default("830"))?;

    let reset = schema.add_child(server, NodeSpec::action("reset"))?;
    let modes = vec![String::from("soft"), String::from("hard")];
    schema.add_input(
        reset,
        NodeSpec::leaf("mode", LeafType::Enumeration(modes)).with_default("soft"),
    )?;
    schema.add_input(reset, NodeSpec::leaf("delay", LeafType::Uint32))?;
    schema.add_output(reset, NodeSpec::leaf("reset-at", LeafType::String).mandatory())?;
    let report = schema.add_output(reset, NodeSpec::container("report"))?;
    schema.add_child(report, NodeSpec::leaf("result", LeafType::String))?;
    schema.add_child(report, NodeSpec::leaf("code", LeafType::Int32).with_default("0"))?;
    schema.add_output(reset, NodeSpec::anyxml("diagnostics"))?;
    Ok(())
}

/// Creates an empty `ex:reboot` request.
///
/// # Errors
///
/// Propagates document construction failures.
pub fn reboot_document(schema: &Arc<Schema>) -> Result<Document, TreeError> {
    let root = schema
        .root(Some(MODULE), "reboot")
        .ok_or_else(|| TreeError::unknown_schema_node("/", "reboot"))?;
    Document::new(Arc::clone(schema), root)
}

/// Creates an `ex:servers` document holding an empty `reset` action request
/// on server `name`.
///
/// # Errors
///
/// Propagates document construction and insertion failures.
pub fn reset_document(schema: &Arc<Schema>, name: &str) -> Result<Document, TreeError> {
    let root = schema
        .root(Some(MODULE), "servers")
        .ok_or_else(|| TreeError::unknown_schema_node("/", "servers"))?;
    let mut document = Document::new(Arc::clone(schema), root)?;
    let path = format!("/ex:servers/server[name={}]/reset", crate::path::quote(name));
    document.insert_path(&path, NodeContent::None, InsertOptions::input())?;
    Ok(document)
}
