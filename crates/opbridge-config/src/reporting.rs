//! Default-value reporting modes negotiated with protocol peers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How nodes carrying schema default values are reported in data replies.
///
/// The names follow the with-defaults capability values used on the wire.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WithDefaultsMode {
    /// Every node is reported, default or not.
    ReportAll,
    /// Leaves whose value equals the schema default are omitted.
    Trim,
    /// Only nodes that were explicitly set are reported.
    #[default]
    Explicit,
    /// Every node is reported and default nodes carry an annotation.
    ReportAllTagged,
}

impl WithDefaultsMode {
    /// Capability parameter value advertised for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReportAll => "report-all",
            Self::Trim => "trim",
            Self::Explicit => "explicit",
            Self::ReportAllTagged => "report-all-tagged",
        }
    }
}

/// Errors encountered while parsing a [`WithDefaultsMode`] from text.
pub type WithDefaultsModeParseError = strum::ParseError;
