use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::enums::{MarkerCategory, MarkerStatus};

/// Threshold triple, ordered toward increasing badness for the marker's direction.
///
/// Older payloads spell the fields `elevated_threshold` / `high_threshold` /
/// `critical_threshold`; those are accepted on input only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(alias = "elevated_threshold")]
    pub elevated: f64,
    #[serde(alias = "high_threshold")]
    pub high: f64,
    #[serde(alias = "critical_threshold")]
    pub critical: f64,
}

impl Thresholds {
    pub fn new(elevated: f64, high: f64, critical: f64) -> Self {
        Self {
            elevated,
            high,
            critical,
        }
    }
}

/// A raw lab measurement as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerInput {
    #[serde(alias = "marker_code")]
    pub code: String,
    #[serde(alias = "marker_name")]
    pub name: String,
    pub category: MarkerCategory,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    pub thresholds: Thresholds,
    #[serde(default, alias = "is_lower_is_worse", alias = "lowerIsWorse")]
    pub lower_is_worse: bool,
    /// Which reference population the thresholds came from (e.g. "Western").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_used: Option<String>,
}

/// One element of a patient's `markers` array.
///
/// Elements that do not fit the marker schema (null value, missing
/// thresholds, wrong types) are kept as raw JSON with the decode error, so
/// one bad element cannot fail the panel or the batch around it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum MarkerEntry {
    Valid(MarkerInput),
    Malformed {
        /// Code, when the element carries a readable one.
        code: Option<String>,
        error: String,
        raw: Value,
    },
}

impl MarkerEntry {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Valid(marker) => Some(&marker.code),
            Self::Malformed { code, .. } => code.as_deref(),
        }
    }
}

impl From<Value> for MarkerEntry {
    fn from(raw: Value) -> Self {
        match MarkerInput::deserialize(&raw) {
            Ok(marker) => Self::Valid(marker),
            Err(e) => Self::Malformed {
                code: ["code", "marker_code"]
                    .iter()
                    .find_map(|key| raw.get(*key).and_then(Value::as_str))
                    .map(str::to_string),
                error: e.to_string(),
                raw,
            },
        }
    }
}

impl From<MarkerInput> for MarkerEntry {
    fn from(marker: MarkerInput) -> Self {
        Self::Valid(marker)
    }
}

impl Serialize for MarkerEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid(marker) => marker.serialize(serializer),
            Self::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

/// A marker after classification. Status, severity and reference range are
/// always engine-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMarker {
    #[serde(flatten)]
    pub marker: MarkerInput,
    pub status: MarkerStatus,
    pub severity: u8,
    pub reference_range: String,
}

impl ClassifiedMarker {
    pub fn code(&self) -> &str {
        &self.marker.code
    }

    pub fn category(&self) -> &MarkerCategory {
        &self.marker.category
    }
}
