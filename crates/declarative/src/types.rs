//! Core types shared by providers, resources and the server
//!
//! - [`StringValue`]: a scalar that may be null, not yet known, or known
//! - [`Diagnostic`] / [`Diagnostics`]: structured errors and warnings
//!   attached to one operation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// JSON key marking a value the orchestrator has not determined yet.
///
/// An unknown value is encoded as `{"unknown": true}`.
pub const UNKNOWN_KEY: &str = "unknown";

/// A string attribute value as seen by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StringValue {
    /// Not set
    #[default]
    Null,
    /// Set, but depends on something not computed yet
    Unknown,
    /// Set to a concrete value
    Known(String),
}

impl StringValue {
    /// A known value
    pub fn known(value: impl Into<String>) -> Self {
        Self::Known(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The value, if known
    pub fn as_known(&self) -> Option<&str> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// The value, or an empty string when null or unknown
    pub fn value_string(&self) -> String {
        self.as_known().unwrap_or_default().to_string()
    }
}

impl From<String> for StringValue {
    fn from(value: String) -> Self {
        Self::Known(value)
    }
}

impl From<&str> for StringValue {
    fn from(value: &str) -> Self {
        Self::Known(value.to_string())
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "<null>"),
            Self::Unknown => write!(f, "<unknown>"),
            Self::Known(v) => write!(f, "{v:?}"),
        }
    }
}

impl Serialize for StringValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Unknown => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNKNOWN_KEY, &true)?;
                map.end()
            }
            Self::Known(v) => serializer.serialize_str(v),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringValueRepr {
    Known(String),
    Marker { unknown: bool },
}

impl<'de> Deserialize<'de> for StringValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<StringValueRepr>::deserialize(deserializer)? {
            None => Self::Null,
            Some(StringValueRepr::Known(v)) => Self::Known(v),
            Some(StringValueRepr::Marker { unknown: true }) => Self::Unknown,
            Some(StringValueRepr::Marker { unknown: false }) => Self::Null,
        })
    }
}

/// Whether a raw JSON value is the unknown marker
pub fn is_unknown_marker(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.len() == 1 && m.get(UNKNOWN_KEY) == Some(&serde_json::Value::Bool(true)))
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A structured error or warning reported to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short, user-facing summary
    pub summary: String,
    /// Longer explanation, usually embedding the underlying error
    pub detail: String,
    /// Attribute the diagnostic refers to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    /// Attach the diagnostic to an attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(attr) = &self.attribute {
            write!(f, "{} [{}]", self.summary, attr)?;
        } else {
            write!(f, "{}", self.summary)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    /// Append all diagnostics from `other`
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Check if any diagnostic is an error
    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
