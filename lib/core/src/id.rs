use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a fingerprinted model.
///
/// Ids are totally ordered so that rankings can break similarity ties
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelId {
    Integer(u64),
    Uuid(Uuid),
    String(String),
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelId::String(s) => write!(f, "{}", s),
            ModelId::Uuid(u) => write!(f, "{}", u),
            ModelId::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        ModelId::String(s)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId::String(s.to_string())
    }
}

impl From<u64> for ModelId {
    fn from(i: u64) -> Self {
        ModelId::Integer(i)
    }
}

impl From<Uuid> for ModelId {
    fn from(u: Uuid) -> Self {
        ModelId::Uuid(u)
    }
}

impl ModelId {
    /// Parse a command-line style id: integers become `Integer`,
    /// hyphenated UUIDs become `Uuid`, anything else is kept as a string.
    pub fn parse(s: &str) -> Self {
        if let Ok(i) = s.parse::<u64>() {
            return ModelId::Integer(i);
        }
        if let Ok(u) = Uuid::parse_str(s) {
            return ModelId::Uuid(u);
        }
        ModelId::String(s.to_string())
    }
}
