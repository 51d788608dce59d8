//! Identifier types for platforms and transfers
//!
//! Platform identifiers are plain string keys that stay stable for the whole
//! process lifetime. Transfer identifiers follow the `tr_<millis36><rand5>`
//! format so they sort roughly by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::IdError;

/// Identifier of a tracked platform (e.g. "studio", "marketplace")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a new PlatformId
    ///
    /// # Panics
    /// Panics if the identifier is empty
    pub fn new(id: impl Into<String>) -> Self {
        let s = id.into();
        assert!(!s.trim().is_empty(), "PlatformId must not be empty");
        Self(s)
    }

    /// Try to create a PlatformId, returning None if empty
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PlatformId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s).ok_or(IdError::EmptyPlatformId)
    }
}

impl From<PlatformId> for String {
    fn from(id: PlatformId) -> Self {
        id.0
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Prefix carried by every transfer identifier
pub const TRANSFER_ID_PREFIX: &str = "tr_";

/// Number of random base36 characters appended to a transfer identifier
pub const TRANSFER_ID_SUFFIX_LEN: usize = 5;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Unique identifier for a transfer
///
/// Format: `tr_<unix millis in base36><5 random base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    /// Build an identifier from a millisecond timestamp and a random seed value.
    ///
    /// Only the low bits of `entropy` needed for the suffix are used.
    pub fn from_parts(millis: u64, entropy: u64) -> Self {
        let mut id = String::with_capacity(20);
        id.push_str(TRANSFER_ID_PREFIX);
        id.push_str(&to_base36(millis));

        let mut rest = entropy;
        for _ in 0..TRANSFER_ID_SUFFIX_LEN {
            id.push(BASE36[(rest % 36) as usize] as char);
            rest /= 36;
        }
        Self(id)
    }

    /// Parse an existing identifier, checking prefix and alphabet
    pub fn parse(s: &str) -> Option<Self> {
        let body = s.strip_prefix(TRANSFER_ID_PREFIX)?;
        if body.len() <= TRANSFER_ID_SUFFIX_LEN {
            return None;
        }
        if !body.bytes().all(|b| BASE36.contains(&b)) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode an unsigned integer in lowercase base36
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_id_creation() {
        let id = PlatformId::new("studio");
        assert_eq!(id.as_str(), "studio");
        assert_eq!(id.to_string(), "studio");
    }

    #[test]
    fn test_platform_id_try_new() {
        assert!(PlatformId::try_new("studio").is_some());
        assert!(PlatformId::try_new("   ").is_none());
    }

    #[test]
    #[should_panic(expected = "PlatformId must not be empty")]
    fn test_platform_id_empty() {
        PlatformId::new("");
    }

    #[test]
    fn test_platform_id_serialization() {
        let id = PlatformId::new("marketplace");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"marketplace\"");
    }

    #[test]
    fn test_platform_id_deserialize_rejects_empty() {
        let id: PlatformId = serde_json::from_str("\"studio\"").unwrap();
        assert_eq!(id.as_str(), "studio");

        assert!(serde_json::from_str::<PlatformId>("\"\"").is_err());
        assert!(serde_json::from_str::<PlatformId>("\"  \"").is_err());
    }

    #[test]
    fn test_platform_id_map_key_roundtrip() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(PlatformId::new("alpha"), 1u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"alpha":1}"#);

        let back: std::collections::BTreeMap<PlatformId, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
        assert!(serde_json::from_str::<std::collections::BTreeMap<PlatformId, u32>>(r#"{"":1}"#).is_err());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_transfer_id_format() {
        let id = TransferId::from_parts(1_700_000_000_000, 0);
        assert_eq!(id.as_str(), "tr_loyw3v2800000");

        let id = TransferId::from_parts(36, 35);
        assert_eq!(id.as_str(), "tr_10z0000");
    }

    #[test]
    fn test_transfer_id_distinct_entropy() {
        let a = TransferId::from_parts(1_000, 1);
        let b = TransferId::from_parts(1_000, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_transfer_id_parse() {
        let id = TransferId::from_parts(123_456, 987_654);
        assert_eq!(TransferId::parse(id.as_str()), Some(id));
        assert!(TransferId::parse("tx_abc12345").is_none());
        assert!(TransferId::parse("tr_ab").is_none());
        assert!(TransferId::parse("tr_ABCDEFG").is_none());
    }
}
