//! Error types for generic operation failures.
//!
//! Each stage of an operation reports failures as an [`OperationError`]. The
//! orchestration layer translates them into protocol errors in a single
//! step through [`OperationError::into_protocol_errors`].

use opbridge_tree::TreeError;
use thiserror::Error;

use crate::backend::{BackendError, OperationKind, StatusCode};
use crate::response::ProtocolError;

/// Errors surfaced while executing a generic operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// A request value could not be converted.
    #[error("invalid value at '{path}': {message}")]
    Validation {
        /// Path of the offending node.
        path: String,
        /// Conversion failure.
        message: String,
    },

    /// Storage for flat values could not be reserved.
    #[error("memory allocation failed ({message})")]
    Allocation {
        /// What was being allocated.
        message: String,
    },

    /// The backend does not know the operation.
    #[error("{kind} '{operation}' is not supported by the backend")]
    BackendUnsupported {
        /// Entry point that was used.
        kind: OperationKind,
        /// Path of the operation.
        operation: String,
    },

    /// The backend reported a failure.
    #[error("sending {kind} '{operation}' to the backend failed ({status})", status = .source.status().description())]
    BackendFailure {
        /// Entry point that was used.
        kind: OperationKind,
        /// Path of the operation.
        operation: String,
        /// Backend status and diagnostics.
        #[source]
        source: BackendError,
        /// Diagnostic text the backend recorded last.
        last_message: Option<String>,
    },

    /// Output could not be assembled into a valid reply.
    #[error("building the reply failed: {source}")]
    ReplyBuild {
        /// Underlying insertion or validation failure.
        #[source]
        source: TreeError,
    },

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violation.
        message: String,
    },
}

impl OperationError {
    /// Creates a validation error.
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an allocation error.
    pub fn allocation(message: impl Into<String>) -> Self {
        Self::Allocation {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(kind: OperationKind, operation: impl Into<String>) -> Self {
        Self::BackendUnsupported {
            kind,
            operation: operation.into(),
        }
    }

    /// Creates a backend failure error.
    pub fn backend_failure(
        kind: OperationKind,
        operation: impl Into<String>,
        source: BackendError,
        last_message: Option<String>,
    ) -> Self {
        Self::BackendFailure {
            kind,
            operation: operation.into(),
            source,
            last_message,
        }
    }

    /// Creates a reply build error.
    pub const fn reply_build(source: TreeError) -> Self {
        Self::ReplyBuild { source }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Backend status behind the error, if the backend reported it.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::BackendFailure { source, .. } => Some(source.status()),
            _ => None,
        }
    }

    /// Translates the error into the protocol errors of an error reply.
    ///
    /// Unsupported operations produce a bare `operation-not-supported`.
    /// Backend failures produce one `operation-failed` per backend detail,
    /// falling back to the backend's last message and then to the status
    /// description. Every other failure produces one `operation-failed`
    /// carrying its own description.
    #[must_use]
    pub fn into_protocol_errors(self) -> Vec<ProtocolError> {
        match self {
            Self::BackendUnsupported { .. } => vec![ProtocolError::operation_not_supported()],
            Self::BackendFailure {
                source,
                last_message,
                ..
            } => {
                let status = source.status();
                let details = source.into_details();
                if details.is_empty() {
                    let text = last_message
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| status.description().to_owned());
                    vec![ProtocolError::operation_failed(text)]
                } else {
                    details
                        .into_iter()
                        .map(|detail| ProtocolError::operation_failed(detail.message).at(detail.path))
                        .collect()
                }
            }
            Self::Validation { ref path, .. } => {
                let path = Some(path.clone());
                vec![ProtocolError::operation_failed(self.to_string()).at(path)]
            }
            other => vec![ProtocolError::operation_failed(other.to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::backend::ErrorDetail;
    use crate::response::{ERROR_LANGUAGE, ErrorTag, ErrorType};

    fn failure(source: BackendError, last_message: Option<&str>) -> OperationError {
        OperationError::backend_failure(
            OperationKind::Rpc,
            "/ex:reboot",
            source,
            last_message.map(str::to_owned),
        )
    }

    #[test]
    fn unsupported_maps_to_bare_protocol_error() {
        let errors = OperationError::unsupported(OperationKind::Action, "/ex:servers").into_protocol_errors();
        assert_eq!(errors, vec![ProtocolError::operation_not_supported()]);
        assert!(errors[0].message.is_none());
    }

    #[test]
    fn one_protocol_error_per_backend_detail() {
        let source = BackendError::new(StatusCode::CallbackFailed)
            .with_detail(ErrorDetail::new("disk full").at("/ex:reboot/delay"))
            .with_detail(ErrorDetail::new("retry later"));
        let errors = failure(source, Some("ignored")).into_protocol_errors();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].text(), Some("disk full"));
        assert_eq!(errors[0].path.as_deref(), Some("/ex:reboot/delay"));
        assert_eq!(errors[1].text(), Some("retry later"));
        assert!(errors.iter().all(|error| {
            error.tag == ErrorTag::OperationFailed
                && error.error_type == ErrorType::Application
                && error.message.as_ref().is_some_and(|m| m.lang == ERROR_LANGUAGE)
        }));
    }

    #[rstest]
    #[case(Some("callback said no"), "callback said no")]
    #[case(Some(""), "Operation failed")]
    #[case(None, "Operation failed")]
    fn falls_back_to_last_message_then_description(
        #[case] last_message: Option<&str>,
        #[case] expected: &str,
    ) {
        let errors =
            failure(BackendError::new(StatusCode::OperationFailed), last_message).into_protocol_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text(), Some(expected));
    }

    #[rstest]
    #[case(OperationError::allocation("3 flat values"), "memory allocation failed (3 flat values)")]
    #[case(OperationError::internal("no action node"), "internal error: no action node")]
    fn internal_failures_become_application_errors(
        #[case] error: OperationError,
        #[case] expected: &str,
    ) {
        let errors = error.into_protocol_errors();
        assert_eq!(errors, vec![ProtocolError::operation_failed(expected)]);
    }

    #[test]
    fn validation_errors_name_the_node() {
        let errors = OperationError::validation("/ex:reboot/delay", "expected uint32").into_protocol_errors();
        assert_eq!(errors[0].path.as_deref(), Some("/ex:reboot/delay"));
        assert_eq!(
            errors[0].text(),
            Some("invalid value at '/ex:reboot/delay': expected uint32")
        );
    }
}
