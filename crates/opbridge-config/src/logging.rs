//! Output formats of the telemetry subscriber.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Event encoding used by the tracing subscriber installed at start-up.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// Single-line text for interactive terminals.
    Compact,
}

/// Error returned for an unrecognised [`LogFormat`] name.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("COMPACT", LogFormat::Compact)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(input).expect("known format"), expected);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(LogFormat::from_str("pretty").is_err());
    }
}
