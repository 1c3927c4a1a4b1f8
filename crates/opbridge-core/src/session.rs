//! Per-session state consulted by generic operations.

use opbridge_config::{Config, Datastore, WithDefaultsMode};
use tracing::info;

use crate::OPERATION_TARGET;
use crate::backend::{Backend, BackendError};
use crate::errors::OperationError;
use crate::guard::AuxLedger;

/// Backend handle and negotiated settings of one protocol session.
///
/// The context is not synchronised; sessions shared across threads must be
/// serialised by their owner.
#[derive(Debug)]
pub struct SessionContext<B> {
    backend: B,
    active: Datastore,
    operation_datastore: Datastore,
    with_defaults: WithDefaultsMode,
    ledger: AuxLedger,
}

impl<B: Backend> SessionContext<B> {
    /// Wraps a backend handle currently pointed at `active`.
    #[must_use]
    pub fn new(backend: B, active: Datastore) -> Self {
        Self {
            backend,
            active,
            operation_datastore: Datastore::default(),
            with_defaults: WithDefaultsMode::default(),
            ledger: AuxLedger::new(),
        }
    }

    /// Uses `ledger` to track auxiliary buffers taken for this session.
    #[must_use]
    pub fn with_ledger(mut self, ledger: AuxLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Applies the configured datastore and default-reporting mode,
    /// switching the backend when it points elsewhere.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure when the switch is refused; the active
    /// datastore is left unchanged in that case.
    pub fn prepare(&mut self, config: &Config) -> Result<(), BackendError> {
        self.with_defaults = config.with_defaults();
        self.operation_datastore = config.operation_datastore();
        if self.active != self.operation_datastore {
            self.backend.switch_datastore(self.operation_datastore)?;
            info!(
                target: OPERATION_TARGET,
                from = %self.active,
                to = %self.operation_datastore,
                "switched session datastore for generic operations"
            );
            self.active = self.operation_datastore;
        }
        Ok(())
    }

    /// Fails unless the backend points at the operation datastore.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Internal`] when [`SessionContext::prepare`]
    /// has not brought the session into the required state.
    pub fn ensure_prepared(&self) -> Result<(), OperationError> {
        if self.active == self.operation_datastore {
            Ok(())
        } else {
            Err(OperationError::internal(format!(
                "session is on the {} datastore, generic operations require {}",
                self.active, self.operation_datastore
            )))
        }
    }

    /// Datastore the backend currently points at.
    #[must_use]
    pub const fn active_datastore(&self) -> Datastore {
        self.active
    }

    /// Datastore generic operations are dispatched against.
    #[must_use]
    pub const fn operation_datastore(&self) -> Datastore {
        self.operation_datastore
    }

    /// Negotiated default-reporting mode.
    #[must_use]
    pub const fn with_defaults(&self) -> WithDefaultsMode {
        self.with_defaults
    }

    /// Ledger tracking auxiliary buffers.
    #[must_use]
    pub const fn ledger(&self) -> &AuxLedger {
        &self.ledger
    }

    /// Backend handle.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend handle.
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
