//! Replies returned to the protocol session layer.
//!
//! A generic operation ends in exactly one [`Reply`]: an acknowledgement, a
//! data document tagged with the negotiated default-reporting mode, or a
//! list of protocol errors. [`ReplyWriter`] frames replies as JSON lines for
//! transports that stream them.

use std::io::{self, Write};

use opbridge_config::WithDefaultsMode;
use opbridge_tree::Document;
use serde::Serialize;
use thiserror::Error;

use crate::render::render_json;

/// Language tag attached to every error message.
pub const ERROR_LANGUAGE: &str = "en";

/// Protocol error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorTag {
    /// The peer asked for an operation nobody implements.
    OperationNotSupported,
    /// The operation was attempted and failed.
    OperationFailed,
}

/// Layer at which a protocol error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Protocol layer.
    Protocol,
    /// Application layer.
    Application,
}

/// Human readable error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// Message text.
    pub text: String,
    /// Language of the text.
    pub lang: &'static str,
}

/// One protocol error of an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolError {
    /// Error condition.
    pub tag: ErrorTag,
    /// Layer the error belongs to.
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Diagnostic text, absent for bare protocol errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ErrorMessage>,
    /// Path of the offending node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ProtocolError {
    /// `operation-not-supported` at the protocol layer, without a message.
    #[must_use]
    pub const fn operation_not_supported() -> Self {
        Self {
            tag: ErrorTag::OperationNotSupported,
            error_type: ErrorType::Protocol,
            message: None,
            path: None,
        }
    }

    /// `operation-failed` at the application layer with a message.
    #[must_use]
    pub fn operation_failed(text: impl Into<String>) -> Self {
        Self {
            tag: ErrorTag::OperationFailed,
            error_type: ErrorType::Application,
            message: Some(ErrorMessage {
                text: text.into(),
                lang: ERROR_LANGUAGE,
            }),
            path: None,
        }
    }

    /// Attaches the path of the offending node.
    #[must_use]
    pub fn at(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    /// Message text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().map(|message| message.text.as_str())
    }
}

/// Outcome of a generic operation.
#[derive(Debug)]
pub enum Reply {
    /// The operation succeeded without output.
    Ok,
    /// The operation produced output.
    Data {
        /// Reply document rooted like the request.
        document: Document,
        /// Default-reporting mode negotiated for the session.
        with_defaults: WithDefaultsMode,
    },
    /// The operation failed; nothing of its output is returned.
    Error(Vec<ProtocolError>),
}

impl Reply {
    /// Whether the reply reports a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Reply document of a data reply.
    #[must_use]
    pub const fn document(&self) -> Option<&Document> {
        match self {
            Self::Data { document, .. } => Some(document),
            Self::Ok | Self::Error(_) => None,
        }
    }

    /// Errors of an error reply; empty otherwise.
    #[must_use]
    pub fn errors(&self) -> &[ProtocolError] {
        match self {
            Self::Error(errors) => errors,
            Self::Ok | Self::Data { .. } => &[],
        }
    }
}

/// Serialised form of a [`Reply`].
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyMessage<'a> {
    /// Acknowledgement.
    Ok,
    /// Data reply.
    Data {
        /// Default-reporting mode the data was rendered with.
        with_defaults: WithDefaultsMode,
        /// Rendered document.
        data: serde_json::Value,
    },
    /// Error reply.
    Error {
        /// Protocol errors in order.
        errors: &'a [ProtocolError],
    },
}

impl<'a> From<&'a Reply> for ReplyMessage<'a> {
    fn from(reply: &'a Reply) -> Self {
        match reply {
            Reply::Ok => Self::Ok,
            Reply::Data {
                document,
                with_defaults,
            } => Self::Data {
                with_defaults: *with_defaults,
                data: render_json(document, *with_defaults),
            },
            Reply::Error(errors) => Self::Error { errors },
        }
    }
}

/// Errors raised while writing replies.
#[derive(Debug, Error)]
pub enum ReplyWriteError {
    /// IO error while writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Reply serialisation failed.
    #[error("failed to serialize reply: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writer that serialises replies as JSON lines.
pub struct ReplyWriter<W> {
    writer: W,
}

impl<W: Write> ReplyWriter<W> {
    /// Creates a new reply writer wrapping the given output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a reply as one JSON line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_reply(&mut self, reply: &Reply) -> Result<(), ReplyWriteError> {
        serde_json::to_writer(&mut self.writer, &ReplyMessage::from(reply))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(reply: &Reply) -> String {
        let mut output = Vec::new();
        ReplyWriter::new(&mut output)
            .write_reply(reply)
            .expect("write reply");
        String::from_utf8(output).expect("valid utf8")
    }

    #[test]
    fn writes_ok_reply() {
        assert_eq!(written(&Reply::Ok), "{\"kind\":\"ok\"}\n");
    }

    #[test]
    fn unsupported_errors_carry_no_message() {
        let reply = Reply::Error(vec![ProtocolError::operation_not_supported()]);
        insta::assert_snapshot!(
            written(&reply).trim_end(),
            @r#"{"kind":"error","errors":[{"tag":"operation-not-supported","type":"protocol"}]}"#
        );
    }

    #[test]
    fn failed_errors_carry_message_language_and_path() {
        let error = ProtocolError::operation_failed("callback refused")
            .at(Some(String::from("/ex:reboot/delay")));
        insta::assert_json_snapshot!(error, @r#"
        {
          "tag": "operation-failed",
          "type": "application",
          "message": {
            "text": "callback refused",
            "lang": "en"
          },
          "path": "/ex:reboot/delay"
        }
        "#);
    }

    #[test]
    fn accessors_match_variants() {
        let reply = Reply::Error(vec![ProtocolError::operation_failed("x")]);
        assert!(reply.is_error());
        assert!(reply.document().is_none());
        assert_eq!(reply.errors()[0].text(), Some("x"));
        assert!(Reply::Ok.errors().is_empty());
    }
}
