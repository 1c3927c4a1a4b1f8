//! Behaviour-driven tests for generic operation execution.

use std::sync::Arc;

use opbridge_config::Datastore;
use opbridge_tree::fixtures::{example_schema, reboot_document, reset_document};
use opbridge_tree::{Document, InsertOptions, NodeContent, NodeId, Schema, SchemaKind};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::{MockService, SentLog, record, sent};
use crate::backend::{BackendError, ErrorDetail, StatusCode};
use crate::guard::{AuxLedger, FlatValue, ValueBatch};
use crate::operation::execute_generic_operation;
use crate::response::{ErrorTag, ErrorType, ProtocolError, Reply};
use crate::session::SessionContext;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum BackendOutcome {
    Output(fn(&AuxLedger) -> ValueBatch),
    Failure(BackendError),
}

struct TestWorld {
    schema: Arc<Schema>,
    request: Option<Document>,
    request_paths: Vec<String>,
    ledger: AuxLedger,
    outcome: BackendOutcome,
    log: SentLog,
    reply: Option<Reply>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld {
        schema: example_schema().expect("schema"),
        request: None,
        request_paths: Vec::new(),
        ledger: AuxLedger::new(),
        outcome: BackendOutcome::Output(|_| ValueBatch::from(Vec::new())),
        log: SentLog::default(),
        reply: None,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn all_paths(document: &Document) -> Vec<String> {
    std::iter::once(document.root())
        .chain(document.descendants(document.root()))
        .filter_map(|id| document.path_of(id).ok())
        .collect()
}

fn node_at(document: &Document, path: &str) -> NodeId {
    std::iter::once(document.root())
        .chain(document.descendants(document.root()))
        .find(|id| document.path_of(*id).is_ok_and(|candidate| candidate == path))
        .unwrap_or_else(|| panic!("no node at {path}: {:?}", all_paths(document)))
}

type Response = Result<ValueBatch, BackendError>;

fn responder(world: &TestWorld) -> impl FnMut(&str, &[FlatValue]) -> Response + Send + 'static {
    let outcome = world.outcome.clone();
    let ledger = world.ledger.clone();
    let log = Arc::clone(&world.log);
    move |path: &str, input: &[FlatValue]| {
        record(&log, path, input);
        match &outcome {
            BackendOutcome::Output(output) => Ok(output(&ledger)),
            BackendOutcome::Failure(error) => Err(error.clone()),
        }
    }
}

fn service_for(world: &TestWorld) -> MockService {
    let mut service = MockService::new();
    service.expect_send_rpc().returning(responder(world));
    service.expect_send_action().returning(responder(world));
    service.expect_last_error_message().returning(|| None);
    service
}

fn reply_document(world: &TestWorld) -> &Document {
    let reply = world.reply.as_ref().expect("operation executed");
    reply
        .document()
        .unwrap_or_else(|| panic!("expected data reply, got {reply:?}"))
}

fn reply_errors(world: &TestWorld) -> &[ProtocolError] {
    world.reply.as_ref().expect("operation executed").errors()
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a reboot request with an explicit delay and a default force flag")]
fn given_reboot_request(world: &mut TestWorld) {
    let mut request = reboot_document(&world.schema).expect("document");
    request
        .insert_path("/ex:reboot/delay", NodeContent::text("30"), InsertOptions::input())
        .expect("delay");
    let force = request
        .insert_path(
            "/ex:reboot/options/force",
            NodeContent::text("false"),
            InsertOptions::input(),
        )
        .expect("force")
        .target;
    request.set_default(force, true).expect("flag force");
    world.request = Some(request);
}

#[given("a reset request for server {name} in hard mode")]
fn given_reset_request(world: &mut TestWorld, name: String) {
    let mut request = reset_document(&world.schema, name.trim_matches('"')).expect("document");
    let action = request
        .find_first(|node| node.kind() == SchemaKind::Action)
        .expect("action");
    let path = format!("{}/mode", request.path_of(action).expect("action path"));
    request
        .insert_path(&path, NodeContent::text("hard"), InsertOptions::input())
        .expect("mode");
    world.request = Some(request);
}

#[given("a backend answering with uptime and a default restart count")]
fn given_uptime_output(world: &mut TestWorld) {
    world.outcome = BackendOutcome::Output(|_| {
        vec![
            FlatValue::new("/ex:reboot/stats/uptime", Value::Uint64(120)),
            FlatValue::default_value("/ex:reboot/stats/restarts", Value::Uint32(0)),
        ]
        .into()
    });
}

#[given("a backend that does not know the operation")]
fn given_unknown_operation(world: &mut TestWorld) {
    world.outcome = BackendOutcome::Failure(BackendError::new(StatusCode::UnknownModel));
}

#[given("a backend answering with a default elapsed time under the summary")]
fn given_summary_output(world: &mut TestWorld) {
    world.outcome = BackendOutcome::Output(|_| {
        vec![FlatValue::default_value(
            "/ex:reboot/summary/detail/timing/elapsed",
            Value::Uint32(0),
        )]
        .into()
    });
}

#[given("a backend answering the reset with a timestamp")]
fn given_reset_output(world: &mut TestWorld) {
    world.outcome = BackendOutcome::Output(|_| {
        vec![
            FlatValue::new(
                "/ex:servers/server[name='alpha']/reset/reset-at",
                Value::String(String::from("2026-10-17T12:00:00Z")),
            ),
            FlatValue::default_value(
                "/ex:servers/server[name='alpha']/reset/report/code",
                Value::Int32(0),
            ),
        ]
        .into()
    });
}

#[given("a backend failing with {message} at {path}")]
fn given_backend_failure(world: &mut TestWorld, message: String, path: String) {
    let detail = ErrorDetail::new(message.trim_matches('"')).at(path.trim_matches('"'));
    world.outcome =
        BackendOutcome::Failure(BackendError::new(StatusCode::CallbackFailed).with_detail(detail));
}

#[given("a backend answering with a trace payload and an unknown leaf")]
fn given_unfit_output(world: &mut TestWorld) {
    world.outcome = BackendOutcome::Output(|ledger| {
        vec![
            FlatValue::new("/ex:reboot/trace", Value::AnyXml(ledger.acquire("<trace/>"))),
            FlatValue::new("/ex:reboot/uptime", Value::Uint64(1)),
        ]
        .into()
    });
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the operation executes")]
fn when_operation_executes(world: &mut TestWorld) {
    let service = service_for(world);
    let request = world.request.as_ref().expect("request prepared");
    world.request_paths = all_paths(request);
    let mut session =
        SessionContext::new(service, Datastore::Running).with_ledger(world.ledger.clone());
    world.reply = Some(execute_generic_operation(request, &mut session));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the backend received {count} input value for {path}")]
fn then_backend_received(world: &mut TestWorld, count: usize, path: String) {
    let requests = sent(&world.log);
    assert_eq!(requests.len(), 1, "expected one backend call: {requests:?}");
    assert_eq!(requests[0].path, path.trim_matches('"'));
    assert_eq!(requests[0].inputs.len(), count, "inputs: {:?}", requests[0].inputs);
}

#[then("the reply node {path} is flagged default")]
fn then_node_default(world: &mut TestWorld, path: String) {
    let document = reply_document(world);
    let node = node_at(document, path.trim_matches('"'));
    assert!(document.is_default(node), "{path} should be flagged default");
}

#[then("the reply node {path} is explicit")]
fn then_node_explicit(world: &mut TestWorld, path: String) {
    let document = reply_document(world);
    let node = node_at(document, path.trim_matches('"'));
    assert!(!document.is_default(node), "{path} should be explicit");
}

#[then("the reply is a bare operation-not-supported error")]
fn then_not_supported(world: &mut TestWorld) {
    let errors = reply_errors(world);
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    assert_eq!(errors[0].tag, ErrorTag::OperationNotSupported);
    assert_eq!(errors[0].error_type, ErrorType::Protocol);
    assert!(errors[0].message.is_none());
}

#[then("the reply carries an operation-failed error {message} at {path}")]
fn then_failed_with(world: &mut TestWorld, message: String, path: String) {
    let errors = reply_errors(world);
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    assert_eq!(errors[0].tag, ErrorTag::OperationFailed);
    assert_eq!(errors[0].error_type, ErrorType::Application);
    assert_eq!(errors[0].text(), Some(message.trim_matches('"')));
    assert_eq!(errors[0].path.as_deref(), Some(path.trim_matches('"')));
}

#[then("the reply is an operation-failed error")]
fn then_failed(world: &mut TestWorld) {
    let errors = reply_errors(world);
    assert!(!errors.is_empty(), "expected an error reply");
    assert!(errors.iter().all(|error| error.tag == ErrorTag::OperationFailed));
}

#[then("the request is unchanged")]
fn then_request_unchanged(world: &mut TestWorld) {
    let request = world.request.as_ref().expect("request prepared");
    assert_eq!(all_paths(request), world.request_paths);
}

#[then("the ledger is balanced")]
fn then_ledger_balanced(world: &mut TestWorld) {
    assert!(
        world.ledger.is_balanced(),
        "acquired {} released {}",
        world.ledger.acquired(),
        world.ledger.released()
    );
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/generic_operation.feature", index = 0)]
fn explicit_inputs_only(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/generic_operation.feature", index = 1)]
fn unknown_operation(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/generic_operation.feature", index = 2)]
fn presence_stops_propagation(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/generic_operation.feature", index = 3)]
fn action_leaves_request_alone(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/generic_operation.feature", index = 4)]
fn backend_diagnostics(world: TestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/generic_operation.feature", index = 5)]
fn unfit_output_rejected(world: TestWorld) {
    let _ = world;
}
