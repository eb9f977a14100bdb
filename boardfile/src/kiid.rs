//! Stable item identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Persistent identity of a board item.
///
/// Modern files store a UUID. Legacy files store a 32-bit hex timestamp,
/// which is embedded in the low bits of an otherwise nil UUID so that both
/// spellings can be looked up through the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kiid(Uuid);

impl Kiid {
    /// A fresh random identity.
    pub fn new() -> Self {
        Kiid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Kiid(uuid)
    }

    pub fn from_legacy_timestamp(timestamp: u32) -> Self {
        if timestamp == 0 {
            return Kiid::new();
        }
        Kiid(Uuid::from_u128(u128::from(timestamp)))
    }

    /// Parse a stored id. Up to eight hex digits is a legacy timestamp;
    /// anything else is tried as a UUID. Unparseable text yields a fresh id.
    pub fn parse(text: &str) -> Self {
        Self::try_parse(text).unwrap_or_default()
    }

    pub fn try_parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.is_empty() && text.len() <= 8 && text.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(text, 16)
                .ok()
                .map(Kiid::from_legacy_timestamp);
        }
        Uuid::parse_str(text).ok().map(Kiid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// True for ids that came from a legacy timestamp.
    pub fn is_legacy_timestamp(&self) -> bool {
        self.0.as_u128() >> 32 == 0
    }
}

impl Default for Kiid {
    fn default() -> Self {
        Kiid::new()
    }
}

impl fmt::Display for Kiid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let id = Kiid::parse("68183921-93a5-49ac-91b0-49d05a0e1647");
        assert_eq!(id.to_string(), "68183921-93a5-49ac-91b0-49d05a0e1647");
        assert!(!id.is_legacy_timestamp());
    }

    #[test]
    fn test_parse_legacy_timestamp() {
        let id = Kiid::parse("4E823D06");
        assert!(id.is_legacy_timestamp());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-00004e823d06");
        assert_eq!(Kiid::parse("4e823d06"), id);
    }

    #[test]
    fn test_zero_timestamp_is_fresh() {
        let a = Kiid::parse("0");
        let b = Kiid::parse("0");
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_is_fresh() {
        assert!(Kiid::try_parse("not-an-id").is_none());
        let id = Kiid::parse("not-an-id");
        assert!(!id.is_legacy_timestamp());
    }
}
