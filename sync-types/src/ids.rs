//! Identity types for synchronized resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor-assigned natural key of a resource instance.
///
/// An opaque string (34 characters for the vendor's own ids, e.g.
/// `CA73ac207638841f3ab868f95b4d201c02`), unique per resource type for the
/// lifetime of the remote system.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sid(String);

impl Sid {
    /// Create a Sid from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value of this Sid.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-letter vendor prefix (`CA`, `RE`, `AC`, ...), if present.
    pub fn prefix(&self) -> Option<&str> {
        self.0.get(..2)
    }
}

impl From<&str> for Sid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Sid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({})", self.0)
    }
}

/// Locally assigned row identifier of a persisted record.
///
/// Assigned by the store on insert, never by the remote source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(i64);

impl LocalId {
    /// Create a LocalId with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this LocalId.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sid_display_is_raw_value() {
        let sid = Sid::new("CA73ac207638841f3ab868f95b4d201c02");
        assert_eq!(sid.to_string(), "CA73ac207638841f3ab868f95b4d201c02");
    }

    #[test]
    fn sid_prefix() {
        assert_eq!(Sid::new("REda6f1e11").prefix(), Some("RE"));
        assert_eq!(Sid::new("A").prefix(), None);
    }

    #[test]
    fn sid_serializes_as_plain_string() {
        let json = serde_json::to_string(&Sid::new("AC1")).unwrap();
        assert_eq!(json, "\"AC1\"");
    }

    #[test]
    fn local_id_ordering() {
        assert!(LocalId::new(1) < LocalId::new(2));
        assert_eq!(LocalId::new(7).value(), 7);
    }
}
