//! Unique identifiers for otiflow entities.
//!
//! Each id wraps a ULID and carries a short human prefix in its string form
//! (`blk-…`, `tpl-…`, `oti-…`) so ids stay recognizable in logs and stored
//! JSON. Parsing accepts both the prefixed and the bare ULID form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

/// Error returned when an id string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid id: {0}")]
pub struct IdParseError(String);

/// Unique identifier for a BuildingBlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(Ulid);

impl BlockId {
    /// Human prefix used in the string form.
    pub const PREFIX: &'static str = "blk";

    /// Generate a new BlockId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for BlockId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("blk-").unwrap_or(s);
        raw.parse()
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unique identifier for a WorkflowTemplate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(Ulid);

impl TemplateId {
    /// Human prefix used in the string form.
    pub const PREFIX: &'static str = "tpl";

    /// Generate a new TemplateId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for TemplateId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("tpl-").unwrap_or(s);
        raw.parse()
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl Serialize for TemplateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unique identifier for an OTI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OtiId(Ulid);

impl OtiId {
    /// Human prefix used in the string form.
    pub const PREFIX: &'static str = "oti";

    /// Generate a new OtiId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for OtiId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OtiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for OtiId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("oti-").unwrap_or(s);
        raw.parse()
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl Serialize for OtiId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OtiId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        let id = BlockId::new();
        assert!(id.to_string().starts_with("blk-"));
    }

    #[test]
    fn parse_accepts_prefixed_and_bare() {
        let id = TemplateId::new();
        let prefixed = id.to_string();
        let bare = prefixed.trim_start_matches("tpl-").to_string();
        assert_eq!(prefixed.parse::<TemplateId>().unwrap(), id);
        assert_eq!(bare.parse::<TemplateId>().unwrap(), id);
    }

    #[test]
    fn serde_round_trip() {
        let id = OtiId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: OtiId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-an-id".parse::<BlockId>().is_err());
    }
}
