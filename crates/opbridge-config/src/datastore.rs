use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Datastore a backend session can be pointed at.
///
/// Generic operations are dispatched against a single configured datastore so
/// that subscribers implementing the operation observe a consistent view.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Datastore {
    /// The running configuration.
    #[default]
    Running,
    /// The configuration loaded at boot.
    Startup,
    /// The scratch configuration awaiting commit.
    Candidate,
    /// Operational state.
    Operational,
}

/// Errors encountered while parsing a [`Datastore`] from text.
pub type DatastoreParseError = strum::ParseError;
