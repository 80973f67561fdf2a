use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A label that does not name any variant of the target enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire label doubles as the serde name so JSON and `as_str` never drift.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Variant order is the ordinal order: NORMAL < ELEVATED < HIGH < CRITICAL.
str_enum!(MarkerStatus {
    Normal => "NORMAL",
    Elevated => "ELEVATED",
    High => "HIGH",
    Critical => "CRITICAL",
});

impl MarkerStatus {
    pub fn is_abnormal(&self) -> bool {
        *self != Self::Normal
    }
}

str_enum!(RiskLevel {
    Low => "LOW",
    Moderate => "MODERATE",
    High => "HIGH",
    Critical => "CRITICAL",
});

str_enum!(AgeTrend {
    Younger => "YOUNGER",
    Matched => "MATCHED",
    Older => "OLDER",
});

str_enum!(RejectionKind {
    InvalidThresholdOrdering => "INVALID_THRESHOLD_ORDERING",
    NonFiniteValue => "NON_FINITE_VALUE",
    DuplicateMarkerCode => "DUPLICATE_MARKER_CODE",
    MalformedMarker => "MALFORMED_MARKER",
});

str_enum!(AgeUnavailableReason {
    MissingChronologicalAge => "MISSING_CHRONOLOGICAL_AGE",
    EmptyMarkerSet => "EMPTY_MARKER_SET",
});

// ---------------------------------------------------------------------------
// MarkerCategory
// ---------------------------------------------------------------------------

/// Clinical grouping of a marker. Labels outside the known set are carried
/// through verbatim as `Other` and score with the default weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarkerCategory {
    Inflammation,
    Metabolism,
    Cardiovascular,
    LiverFunction,
    KidneyFunction,
    ThyroidFunction,
    VitaminsMinerals,
    Hormones,
    BloodHealth,
    Other(String),
}

impl MarkerCategory {
    pub const KNOWN: [MarkerCategory; 9] = [
        Self::Inflammation,
        Self::Metabolism,
        Self::Cardiovascular,
        Self::LiverFunction,
        Self::KidneyFunction,
        Self::ThyroidFunction,
        Self::VitaminsMinerals,
        Self::Hormones,
        Self::BloodHealth,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inflammation => "Inflammation",
            Self::Metabolism => "Metabolism",
            Self::Cardiovascular => "Cardiovascular",
            Self::LiverFunction => "Liver Function",
            Self::KidneyFunction => "Kidney Function",
            Self::ThyroidFunction => "Thyroid Function",
            Self::VitaminsMinerals => "Vitamins/Minerals",
            Self::Hormones => "Hormones",
            Self::BloodHealth => "Blood Health",
            Self::Other(label) => label,
        }
    }

    /// Normalize an incoming label. Accepts the short backend names
    /// ("Liver", "Kidney") alongside the display names, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "inflammation" => Self::Inflammation,
            "metabolism" => Self::Metabolism,
            "cardiovascular" => Self::Cardiovascular,
            "liver" | "liver function" => Self::LiverFunction,
            "kidney" | "kidney function" => Self::KidneyFunction,
            "thyroid" | "thyroid function" => Self::ThyroidFunction,
            "vitamins/minerals" => Self::VitaminsMinerals,
            "hormones" => Self::Hormones,
            "blood health" => Self::BloodHealth,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for MarkerCategory {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<MarkerCategory> for String {
    fn from(category: MarkerCategory) -> Self {
        category.as_str().to_string()
    }
}

impl std::fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
