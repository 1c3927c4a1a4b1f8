//! JSON rendering of data replies.
//!
//! Member names carry the module prefix on the top node and wherever the
//! module changes. Lists and leaf-lists become arrays; booleans and integers
//! up to 32 bits become JSON literals, 64-bit and decimal values stay
//! strings; an empty leaf renders as `[null]`.

use opbridge_config::WithDefaultsMode;
use opbridge_tree::{Document, LeafType, NodeContent, NodeId, SchemaKind, SchemaNode};
use serde_json::{Map, Value, json};

/// Annotation marking a default node in `report-all-tagged` mode.
pub const DEFAULT_ANNOTATION: &str = "ietf-netconf-with-defaults:default";

/// Renders `document` honouring the with-defaults `mode`.
///
/// `report-all` prints every node, `trim` omits leaves whose value equals
/// the schema default, `explicit` omits nodes flagged default and
/// `report-all-tagged` prints everything and annotates default leaves.
#[must_use]
pub fn render_json(document: &Document, mode: WithDefaultsMode) -> Value {
    let renderer = Renderer { document, mode };
    let root = document.root();
    let mut top = Map::new();
    if let Some(value) = renderer.node_value(root) {
        top.insert(renderer.member_name(root), value);
    }
    Value::Object(top)
}

struct Renderer<'a> {
    document: &'a Document,
    mode: WithDefaultsMode,
}

impl Renderer<'_> {
    fn is_hidden(&self, id: NodeId, schema: &SchemaNode) -> bool {
        match self.mode {
            WithDefaultsMode::ReportAll | WithDefaultsMode::ReportAllTagged => false,
            WithDefaultsMode::Explicit => self.document.is_default(id),
            WithDefaultsMode::Trim => {
                schema.kind() == SchemaKind::Leaf
                    && schema
                        .default_value()
                        .is_some_and(|default| self.document.text(id) == Some(default))
            }
        }
    }

    fn member_name(&self, id: NodeId) -> String {
        let Ok(schema) = self.document.schema_of(id) else {
            return String::new();
        };
        let parent_module = self
            .document
            .parent(id)
            .and_then(|parent| self.document.schema_of(parent).ok())
            .map(SchemaNode::module);
        if parent_module == Some(schema.module()) {
            schema.name().to_owned()
        } else {
            format!("{}:{}", schema.module(), schema.name())
        }
    }

    fn node_value(&self, id: NodeId) -> Option<Value> {
        let schema = self.document.schema_of(id).ok()?;
        if self.is_hidden(id, schema) {
            return None;
        }
        let node = self.document.node(id)?;
        match schema.kind() {
            SchemaKind::Leaf | SchemaKind::LeafList => {
                Some(leaf_value(schema.leaf_type(), node.text().unwrap_or_default()))
            }
            SchemaKind::AnyXml | SchemaKind::AnyData => Some(payload_value(node.content())),
            SchemaKind::Container { presence } => {
                let members = self.members(id);
                (presence || !members.is_empty() || self.keeps_empty_containers())
                    .then_some(Value::Object(members))
            }
            SchemaKind::Rpc | SchemaKind::Action | SchemaKind::List { .. } => {
                Some(Value::Object(self.members(id)))
            }
        }
    }

    fn keeps_empty_containers(&self) -> bool {
        matches!(
            self.mode,
            WithDefaultsMode::ReportAll | WithDefaultsMode::ReportAllTagged
        )
    }

    fn members(&self, id: NodeId) -> Map<String, Value> {
        let mut members = Map::new();
        for child in self.document.children(id).iter().copied() {
            let Some(value) = self.node_value(child) else {
                continue;
            };
            let Ok(schema) = self.document.schema_of(child) else {
                continue;
            };
            let name = self.member_name(child);
            if matches!(schema.kind(), SchemaKind::List { .. } | SchemaKind::LeafList) {
                let entries = members
                    .entry(name)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(entries) = entries {
                    entries.push(value);
                }
                continue;
            }
            if self.mode == WithDefaultsMode::ReportAllTagged && self.document.is_default(child) {
                members.insert(format!("@{name}"), json!({ DEFAULT_ANNOTATION: true }));
            }
            members.insert(name, value);
        }
        members
    }
}

fn leaf_value(leaf_type: Option<&LeafType>, text: &str) -> Value {
    let parsed = match leaf_type {
        Some(LeafType::Boolean) => text.parse::<bool>().ok().map(Value::Bool),
        Some(
            LeafType::Int8
            | LeafType::Int16
            | LeafType::Int32
            | LeafType::Uint8
            | LeafType::Uint16
            | LeafType::Uint32,
        ) => text.parse::<i64>().ok().map(Value::from),
        Some(LeafType::Empty) => Some(json!([null])),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(text.to_owned()))
}

fn payload_value(content: &NodeContent) -> Value {
    match content {
        NodeContent::Payload(payload) | NodeContent::Text(payload) => {
            serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.clone()))
        }
        NodeContent::None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use opbridge_tree::fixtures::{example_schema, reboot_document};
    use opbridge_tree::{InsertOptions, NodeSpec, Schema};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    /// `stats/uptime` explicit, `stats/restarts` added as a default, `tags`
    /// holding two entries.
    #[fixture]
    fn reply() -> Document {
        let schema = example_schema().expect("schema");
        let mut document = reboot_document(&schema).expect("document");
        for (path, value) in [
            ("/ex:reboot/stats/uptime", "12"),
            ("/ex:reboot/tags[.='a']", "a"),
            ("/ex:reboot/tags[.='b']", "b"),
        ] {
            document
                .insert_path(path, NodeContent::text(value), InsertOptions::output_update())
                .expect("insert");
        }
        document.validate_reply(document.root()).expect("valid");
        document
    }

    #[rstest]
    fn report_all_prints_defaults(reply: Document) {
        let rendered = render_json(&reply, WithDefaultsMode::ReportAll);
        assert_eq!(
            rendered,
            json!({"ex:reboot": {"stats": {"uptime": "12", "restarts": 0}, "tags": ["a", "b"]}})
        );
    }

    #[rstest]
    #[case(WithDefaultsMode::Explicit)]
    #[case(WithDefaultsMode::Trim)]
    fn explicit_and_trim_hide_defaults(reply: Document, #[case] mode: WithDefaultsMode) {
        let rendered = render_json(&reply, mode);
        assert_eq!(
            rendered,
            json!({"ex:reboot": {"stats": {"uptime": "12"}, "tags": ["a", "b"]}})
        );
    }

    #[rstest]
    fn tagged_mode_annotates_defaults(reply: Document) {
        let rendered = render_json(&reply, WithDefaultsMode::ReportAllTagged);
        insta::assert_snapshot!(
            serde_json::to_string_pretty(&rendered["ex:reboot"]["stats"]).expect("json"),
            @r#"
        {
          "@restarts": {
            "ietf-netconf-with-defaults:default": true
          },
          "restarts": 0,
          "uptime": "12"
        }
        "#
        );
    }

    #[test]
    fn annotation_follows_qualified_member_name() {
        let mut schema = Schema::new();
        let ping = schema.add_root("ex", NodeSpec::rpc("ping")).expect("rpc");
        schema
            .add_output(
                ping,
                NodeSpec::leaf("hops", LeafType::Uint8)
                    .in_module("ext")
                    .with_default("1"),
            )
            .expect("output");
        let mut reply = Document::new(Arc::new(schema), ping).expect("document");
        reply.validate_reply(reply.root()).expect("valid");

        let rendered = render_json(&reply, WithDefaultsMode::ReportAllTagged);
        assert_eq!(
            rendered,
            json!({"ex:ping": {
                "ext:hops": 1,
                "@ext:hops": {"ietf-netconf-with-defaults:default": true}
            }})
        );
    }

    #[rstest]
    fn trim_compares_values_not_flags(mut reply: Document) {
        reply
            .insert_path(
                "/ex:reboot/stats/restarts",
                NodeContent::text("0"),
                InsertOptions::output_update(),
            )
            .expect("update");
        let stats = reply.first_child(reply.root()).expect("stats");
        for child in reply.children(stats).to_vec() {
            reply.set_default(child, false).expect("clear flag");
        }

        let trimmed = render_json(&reply, WithDefaultsMode::Trim);
        assert_eq!(trimmed["ex:reboot"]["stats"], json!({"uptime": "12"}));
        let explicit = render_json(&reply, WithDefaultsMode::Explicit);
        assert_eq!(explicit["ex:reboot"]["stats"]["restarts"], json!(0));
    }
}
