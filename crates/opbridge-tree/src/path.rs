//! Identifying paths for data nodes.
//!
//! Paths are absolute, slash separated and name each node on the way down:
//!
//! ```text
//! /ex:servers/server[name='alpha']/reset
//! /ex:reboot/tags[.='urgent']
//! ```
//!
//! A segment may carry a module prefix; list entries are selected by key
//! predicates and leaf-list entries by a `.` predicate. Predicate values are
//! quoted with `'` or `"` and may contain slashes.

use std::fmt;

use crate::error::TreeError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Module prefix, when given.
    pub module: Option<String>,
    /// Node name.
    pub name: String,
    /// Predicates selecting a list or leaf-list entry.
    pub predicates: Vec<Predicate>,
}

/// A `[key='value']` or `[.='value']` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Key leaf name, `None` for the leaf-list `.` form.
    pub key: Option<String>,
    /// Expected value.
    pub value: String,
}

impl PathSegment {
    /// Value of the key predicate named `key`.
    #[must_use]
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.predicates
            .iter()
            .find(|predicate| predicate.key.as_deref() == Some(key))
            .map(|predicate| predicate.value.as_str())
    }

    /// Value of the `.` predicate.
    #[must_use]
    pub fn self_value(&self) -> Option<&str> {
        self.predicates
            .iter()
            .find(|predicate| predicate.key.is_none())
            .map(|predicate| predicate.value.as_str())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}:")?;
        }
        f.write_str(&self.name)?;
        for predicate in &self.predicates {
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key.as_deref().unwrap_or(".");
        write!(f, "[{key}={}]", quote(&self.value))
    }
}

/// Quotes a predicate value, preferring single quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}

/// Parses an absolute path into its segments.
///
/// # Errors
///
/// Returns [`TreeError::PathSyntax`] for relative paths, empty segments,
/// invalid names or malformed predicates.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, TreeError> {
    let mut rest = path
        .strip_prefix('/')
        .ok_or_else(|| TreeError::path_syntax(path, "path must be absolute"))?;
    let mut segments = Vec::new();
    loop {
        let (segment, remainder) = parse_segment(path, rest)?;
        segments.push(segment);
        if remainder.is_empty() {
            return Ok(segments);
        }
        rest = remainder.strip_prefix('/').ok_or_else(|| {
            TreeError::path_syntax(path, format!("unexpected characters '{remainder}'"))
        })?;
    }
}

fn parse_segment<'a>(path: &str, input: &'a str) -> Result<(PathSegment, &'a str), TreeError> {
    let end = input.find(['/', '[']).unwrap_or(input.len());
    let (qualified, mut rest) = input.split_at(end);
    let (module, name) = match qualified.split_once(':') {
        Some((module, name)) => (Some(module), name),
        None => (None, qualified),
    };
    if let Some(module) = module {
        check_identifier(path, module)?;
    }
    check_identifier(path, name)?;

    let mut predicates = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let (predicate, after) = parse_predicate(path, inner)?;
        predicates.push(predicate);
        rest = after;
    }

    Ok((
        PathSegment {
            module: module.map(str::to_owned),
            name: name.to_owned(),
            predicates,
        },
        rest,
    ))
}

fn parse_predicate<'a>(path: &str, input: &'a str) -> Result<(Predicate, &'a str), TreeError> {
    let (raw_key, after_eq) = input
        .split_once('=')
        .ok_or_else(|| TreeError::path_syntax(path, "predicate without '='"))?;
    let key = match raw_key.trim() {
        "." => None,
        // Key names may repeat the module prefix.
        qualified => {
            let local = qualified
                .split_once(':')
                .map_or(qualified, |(_, local)| local);
            check_identifier(path, local)?;
            Some(local.to_owned())
        }
    };

    let quoted = after_eq.trim_start();
    let quote_char = quoted
        .chars()
        .next()
        .filter(|c| matches!(c, '\'' | '"'))
        .ok_or_else(|| TreeError::path_syntax(path, "predicate value must be quoted"))?;
    let body = quoted.strip_prefix(quote_char).unwrap_or(quoted);
    let close = body
        .find(quote_char)
        .ok_or_else(|| TreeError::path_syntax(path, "unterminated predicate value"))?;
    let (value, after_value) = body.split_at(close);
    let after_value = after_value
        .strip_prefix(quote_char)
        .unwrap_or(after_value)
        .trim_start();
    let rest = after_value
        .strip_prefix(']')
        .ok_or_else(|| TreeError::path_syntax(path, "predicate without closing ']'"))?;

    Ok((
        Predicate {
            key,
            value: value.to_owned(),
        },
        rest,
    ))
}

fn check_identifier(path: &str, name: &str) -> Result<(), TreeError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        Ok(())
    } else {
        Err(TreeError::path_syntax(
            path,
            format!("invalid identifier '{name}'"),
        ))
    }
}
