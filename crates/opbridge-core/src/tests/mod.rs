//! Cross-module tests for generic operation execution.

mod behaviour;

use std::sync::{Arc, Mutex};

use mockall::mock;
use opbridge_config::Datastore;

use crate::backend::{Backend, BackendError};
use crate::guard::{FlatValue, ValueBatch};

mock! {
    pub Service {}
    impl Backend for Service {
        fn send_rpc(&mut self, path: &str, input: &[FlatValue]) -> Result<ValueBatch, BackendError>;
        fn send_action(
            &mut self,
            path: &str,
            input: &[FlatValue],
        ) -> Result<ValueBatch, BackendError>;
        fn last_error_message(&self) -> Option<String>;
        fn switch_datastore(&mut self, datastore: Datastore) -> Result<(), BackendError>;
    }
}

/// Request captured by a mocked backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SentRequest {
    pub path: String,
    pub inputs: Vec<String>,
}

/// Shared log of the requests a mocked backend received.
pub(crate) type SentLog = Arc<Mutex<Vec<SentRequest>>>;

pub(crate) fn record(log: &SentLog, path: &str, input: &[FlatValue]) {
    let request = SentRequest {
        path: path.to_owned(),
        inputs: input.iter().map(|value| value.path().to_owned()).collect(),
    };
    log.lock().expect("sent log").push(request);
}

pub(crate) fn sent(log: &SentLog) -> Vec<SentRequest> {
    log.lock().expect("sent log").clone()
}
