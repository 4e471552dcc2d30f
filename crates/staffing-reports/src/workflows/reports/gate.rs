use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 over the canonical JSON form of a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportDigest(String);

impl ReportDigest {
    /// Wraps a digest read back from storage.
    pub fn from_stored(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GateDecision {
    Unchanged,
    Changed,
}

impl GateDecision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
        }
    }

    pub const fn should_publish(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Rebuilds every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

pub fn canonical_json<T: Serialize + ?Sized>(record: &T) -> Result<String, serde_json::Error> {
    let value = canonicalize(serde_json::to_value(record)?);
    serde_json::to_string(&value)
}

pub fn digest<T: Serialize + ?Sized>(record: &T) -> Result<ReportDigest, serde_json::Error> {
    let canonical = canonical_json(record)?;
    let hash = Sha256::digest(canonical.as_bytes());
    Ok(ReportDigest(hex::encode(hash)))
}

pub fn decide(current: &ReportDigest, previous: Option<&ReportDigest>) -> GateDecision {
    match previous {
        Some(stored) if stored == current => GateDecision::Unchanged,
        _ => GateDecision::Changed,
    }
}
