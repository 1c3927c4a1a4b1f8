//! Built-in leaf types and their lexical checks.

/// Built-in type of a leaf or leaf-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafType {
    /// Arbitrary character data.
    String,
    /// `true` or `false`.
    Boolean,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Fixed-point decimal with the given number of fraction digits (1..=18).
    Decimal64 {
        /// Digits after the decimal point.
        fraction_digits: u8,
    },
    /// A leaf without a value.
    Empty,
    /// One of a fixed set of names.
    Enumeration(Vec<String>),
    /// Space separated set of bit names.
    Bits,
    /// Reference to an identity.
    IdentityRef,
    /// Path to a data instance.
    InstanceIdentifier,
    /// Base64 encoded octets.
    Binary,
}

impl LeafType {
    /// Short type name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 { .. } => "decimal64",
            Self::Empty => "empty",
            Self::Enumeration(_) => "enumeration",
            Self::Bits => "bits",
            Self::IdentityRef => "identityref",
            Self::InstanceIdentifier => "instance-identifier",
            Self::Binary => "binary",
        }
    }

    /// Checks that `text` is a valid lexical value of this type.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first problem found.
    pub fn check(&self, text: &str) -> Result<(), String> {
        match self {
            Self::String | Self::Bits => Ok(()),
            Self::Boolean => match text {
                "true" | "false" => Ok(()),
                _ => Err(String::from("expected 'true' or 'false'")),
            },
            Self::Int8 => check_parse::<i8>(text, self),
            Self::Int16 => check_parse::<i16>(text, self),
            Self::Int32 => check_parse::<i32>(text, self),
            Self::Int64 => check_parse::<i64>(text, self),
            Self::Uint8 => check_parse::<u8>(text, self),
            Self::Uint16 => check_parse::<u16>(text, self),
            Self::Uint32 => check_parse::<u32>(text, self),
            Self::Uint64 => check_parse::<u64>(text, self),
            Self::Decimal64 { fraction_digits } => {
                parse_decimal64(text, *fraction_digits).map(|_| ())
            }
            Self::Empty => {
                if text.is_empty() {
                    Ok(())
                } else {
                    Err(String::from("empty leaf cannot carry a value"))
                }
            }
            Self::Enumeration(names) => {
                if names.iter().any(|name| name == text) {
                    Ok(())
                } else {
                    Err(format!("expected one of {}", names.join(", ")))
                }
            }
            Self::IdentityRef | Self::InstanceIdentifier => {
                if text.trim().is_empty() {
                    Err(format!("{} cannot be empty", self.name()))
                } else {
                    Ok(())
                }
            }
            Self::Binary => {
                if text
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=') || c.is_ascii_whitespace())
                {
                    Ok(())
                } else {
                    Err(String::from("expected base64 characters"))
                }
            }
        }
    }
}

fn check_parse<T: std::str::FromStr>(text: &str, leaf_type: &LeafType) -> Result<(), String> {
    text.parse::<T>()
        .map(|_| ())
        .map_err(|_| format!("expected {}", leaf_type.name()))
}

/// Parses a decimal64 lexical value into its scaled integer representation.
///
/// `"3.14"` with two fraction digits yields `314`.
///
/// # Errors
///
/// Returns a description of the problem when the text is not a decimal
/// number, has more fraction digits than allowed, or overflows.
pub fn parse_decimal64(text: &str, fraction_digits: u8) -> Result<i64, String> {
    if !(1..=18).contains(&fraction_digits) {
        return Err(format!("fraction-digits {fraction_digits} out of range"));
    }
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((_, "")) => return Err(String::from("missing digits after '.'")),
        Some(parts) => parts,
        None => (unsigned, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(String::from("expected decimal digits"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(String::from("expected decimal digits"));
    }
    let scale = usize::from(fraction_digits);
    if fraction.len() > scale {
        return Err(format!("at most {fraction_digits} fraction digits allowed"));
    }

    let mut digits = String::with_capacity(whole.len() + scale);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat_n('0', scale - fraction.len()));
    let magnitude = digits
        .parse::<i64>()
        .map_err(|_| String::from("decimal64 value out of range"))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Formats a scaled decimal64 value in canonical form.
///
/// Trailing fraction zeros are dropped, keeping at least one digit.
#[must_use]
pub fn format_decimal64(value: i64, fraction_digits: u8) -> String {
    let scale = usize::from(fraction_digits);
    let mut digits = value.unsigned_abs().to_string();
    if digits.len() <= scale {
        let padding = scale + 1 - digits.len();
        digits.insert_str(0, &"0".repeat(padding));
    }
    let (whole, fraction) = digits.split_at(digits.len() - scale);
    let trimmed = fraction.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{whole}.{fraction}")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(LeafType::Boolean, "true")]
    #[case(LeafType::Int8, "-128")]
    #[case(LeafType::Uint16, "830")]
    #[case(LeafType::Decimal64 { fraction_digits: 2 }, "3.1")]
    #[case(LeafType::Empty, "")]
    #[case(LeafType::Enumeration(vec!["soft".into(), "hard".into()]), "hard")]
    #[case(LeafType::Binary, "aGVsbG8=")]
    fn accepts_valid_lexical_values(#[case] leaf_type: LeafType, #[case] text: &str) {
        assert!(leaf_type.check(text).is_ok(), "{} rejected {text:?}", leaf_type.name());
    }

    #[rstest]
    #[case(LeafType::Boolean, "yes")]
    #[case(LeafType::Int8, "128")]
    #[case(LeafType::Uint32, "-1")]
    #[case(LeafType::Decimal64 { fraction_digits: 1 }, "1.25")]
    #[case(LeafType::Empty, "x")]
    #[case(LeafType::Enumeration(vec!["soft".into()]), "hard")]
    #[case(LeafType::IdentityRef, " ")]
    fn rejects_invalid_lexical_values(#[case] leaf_type: LeafType, #[case] text: &str) {
        assert!(leaf_type.check(text).is_err(), "{} accepted {text:?}", leaf_type.name());
    }

    #[rstest]
    #[case("3.14", 2, 314)]
    #[case("-0.5", 3, -500)]
    #[case("7", 1, 70)]
    fn parses_decimal64(#[case] text: &str, #[case] digits: u8, #[case] expected: i64) {
        assert_eq!(parse_decimal64(text, digits), Ok(expected));
    }

    #[rstest]
    #[case(314, 2, "3.14")]
    #[case(-500, 3, "-0.5")]
    #[case(70, 1, "7.0")]
    #[case(5, 3, "0.005")]
    fn formats_decimal64_canonically(#[case] value: i64, #[case] digits: u8, #[case] expected: &str) {
        assert_eq!(format_decimal64(value, digits), expected);
    }
}
