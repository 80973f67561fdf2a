use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::enums::{MarkerCategory, RiskLevel};

use super::types::ScoringError;

pub const WEIGHTS_FILE: &str = "category_weights.json";
pub const BREAKPOINTS_FILE: &str = "risk_breakpoints.json";
pub const PATTERNS_FILE: &str = "pattern_catalog.json";

// ---------------------------------------------------------------------------
// Breakpoint tables
// ---------------------------------------------------------------------------
// Two tables on purpose: category risk levels cut at 2.5 / 5.0 on the
// average severity, the overall category cuts at 3.0 / 6.0 / 8.0 on the
// weighted score. Keep them as separate types so they cannot be swapped.

/// Cut points for `CategoryRisk::risk_level`, applied to average severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRiskBreakpoints {
    pub moderate_from: f64,
    pub high_from: f64,
}

impl CategoryRiskBreakpoints {
    pub fn level_for(&self, average_severity: f64) -> RiskLevel {
        if average_severity < self.moderate_from {
            RiskLevel::Low
        } else if average_severity < self.high_from {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

/// Cut points for `RiskAssessment::risk_category`, applied to the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallRiskBreakpoints {
    pub moderate_from: f64,
    pub high_from: f64,
    pub critical_from: f64,
}

impl OverallRiskBreakpoints {
    pub fn category_for(&self, score: f64) -> RiskLevel {
        if score < self.moderate_from {
            RiskLevel::Low
        } else if score < self.high_from {
            RiskLevel::Moderate
        } else if score < self.critical_from {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

/// Calibration for the biological age estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiologicalAgeParams {
    /// Average severity that maps to a zero age delta.
    pub severity_midpoint: f64,
    /// Years of age delta per severity unit.
    pub years_per_severity: f64,
}

// ---------------------------------------------------------------------------
// Pattern catalog
// ---------------------------------------------------------------------------

fn default_min_abnormal() -> usize {
    2
}

/// One co-occurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    pub description: String,
    /// Codes whose abnormal members make up the pattern's marker set.
    pub watchlist: Vec<String>,
    /// Codes counted toward the trigger. `None` counts the whole watchlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_codes: Option<Vec<String>>,
    /// Abnormal trigger markers needed to fire.
    #[serde(default = "default_min_abnormal")]
    pub min_abnormal: usize,
}

impl PatternRule {
    fn simple(name: &str, codes: &[&str], description: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            watchlist: codes.iter().map(|c| c.to_string()).collect(),
            trigger_codes: None,
            min_abnormal: default_min_abnormal(),
        }
    }

    pub fn watches(&self, code: &str) -> bool {
        self.watchlist.iter().any(|c| c == code)
    }

    pub fn counts_toward_trigger(&self, code: &str) -> bool {
        match &self.trigger_codes {
            Some(codes) => codes.iter().any(|c| c == code),
            None => self.watches(code),
        }
    }
}

// ---------------------------------------------------------------------------
// On-disk layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightsFile {
    default_weight: f64,
    weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BreakpointsFile {
    category: CategoryRiskBreakpoints,
    overall: OverallRiskBreakpoints,
    biological_age: BiologicalAgeParams,
}

// ---------------------------------------------------------------------------
// ScoringReferenceData
// ---------------------------------------------------------------------------

/// Read-only lookup tables the engine scores against.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringReferenceData {
    /// Keyed by category display name.
    pub category_weights: BTreeMap<String, f64>,
    pub default_weight: f64,
    pub category_breakpoints: CategoryRiskBreakpoints,
    pub overall_breakpoints: OverallRiskBreakpoints,
    pub biological_age: BiologicalAgeParams,
    pub patterns: Vec<PatternRule>,
}

impl Default for ScoringReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScoringReferenceData {
    /// The clinical tables the engine ships with.
    pub fn builtin() -> Self {
        let category_weights = [
            (MarkerCategory::Inflammation, 1.5),
            (MarkerCategory::Metabolism, 1.5),
            (MarkerCategory::Cardiovascular, 1.3),
            (MarkerCategory::LiverFunction, 1.2),
            (MarkerCategory::KidneyFunction, 1.2),
            (MarkerCategory::ThyroidFunction, 1.1),
            (MarkerCategory::VitaminsMinerals, 1.0),
            (MarkerCategory::Hormones, 1.1),
            (MarkerCategory::BloodHealth, 1.2),
        ]
        .into_iter()
        .map(|(category, weight)| (category.as_str().to_string(), weight))
        .collect();

        Self {
            category_weights,
            default_weight: 1.0,
            category_breakpoints: CategoryRiskBreakpoints {
                moderate_from: 2.5,
                high_from: 5.0,
            },
            overall_breakpoints: OverallRiskBreakpoints {
                moderate_from: 3.0,
                high_from: 6.0,
                critical_from: 8.0,
            },
            biological_age: BiologicalAgeParams {
                severity_midpoint: 5.0,
                years_per_severity: 1.5,
            },
            patterns: builtin_patterns(),
        }
    }

    /// Load reference tables from JSON files in `resources_dir`.
    pub fn load(resources_dir: &Path) -> Result<Self, ScoringError> {
        let weights: WeightsFile = read_json(resources_dir, WEIGHTS_FILE)?;
        let breakpoints: BreakpointsFile = read_json(resources_dir, BREAKPOINTS_FILE)?;
        let patterns: Vec<PatternRule> = read_json(resources_dir, PATTERNS_FILE)?;

        let mut category_weights = BTreeMap::new();
        for (label, weight) in weights.weights {
            let key = MarkerCategory::from_label(&label).as_str().to_string();
            if category_weights.insert(key.clone(), weight).is_some() {
                return Err(ScoringError::InvalidReferenceData(format!(
                    "{WEIGHTS_FILE} names category {key} more than once (last spelling: {label})"
                )));
            }
        }

        let data = Self {
            category_weights,
            default_weight: weights.default_weight,
            category_breakpoints: breakpoints.category,
            overall_breakpoints: breakpoints.overall,
            biological_age: breakpoints.biological_age,
            patterns,
        };
        data.validate()?;
        Ok(data)
    }

    /// Load from `resources_dir`, falling back to the built-in tables when the
    /// files are missing or invalid.
    pub fn load_or_builtin(resources_dir: &Path) -> Self {
        match Self::load(resources_dir) {
            Ok(data) => {
                tracing::info!(dir = %resources_dir.display(), "Loaded scoring reference data");
                data
            }
            Err(e) => {
                tracing::warn!(
                    dir = %resources_dir.display(),
                    error = %e,
                    "Reference data unavailable, using built-in tables"
                );
                Self::builtin()
            }
        }
    }

    /// Write the tables as the three JSON files `load` reads. Backs the
    /// CLI's `--export-reference`.
    pub fn write_to(&self, resources_dir: &Path) -> Result<(), ScoringError> {
        let weights = WeightsFile {
            default_weight: self.default_weight,
            weights: self.category_weights.clone(),
        };
        let breakpoints = BreakpointsFile {
            category: self.category_breakpoints.clone(),
            overall: self.overall_breakpoints.clone(),
            biological_age: self.biological_age.clone(),
        };
        write_json(resources_dir, WEIGHTS_FILE, &weights)?;
        write_json(resources_dir, BREAKPOINTS_FILE, &breakpoints)?;
        write_json(resources_dir, PATTERNS_FILE, &self.patterns)
    }

    /// Semantic checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let invalid = |msg: String| Err(ScoringError::InvalidReferenceData(msg));

        if !is_positive(self.default_weight) {
            return invalid(format!("default weight must be positive, got {}", self.default_weight));
        }
        if let Some((category, weight)) = self
            .category_weights
            .iter()
            .find(|(_, w)| !is_positive(**w))
        {
            return invalid(format!("weight for {category} must be positive, got {weight}"));
        }

        let c = &self.category_breakpoints;
        if !(c.moderate_from.is_finite() && c.high_from.is_finite() && c.moderate_from < c.high_from) {
            return invalid(format!(
                "category breakpoints must ascend: moderate={}, high={}",
                c.moderate_from, c.high_from
            ));
        }

        let o = &self.overall_breakpoints;
        if !(o.moderate_from.is_finite()
            && o.critical_from.is_finite()
            && o.moderate_from < o.high_from
            && o.high_from < o.critical_from)
        {
            return invalid(format!(
                "overall breakpoints must ascend: moderate={}, high={}, critical={}",
                o.moderate_from, o.high_from, o.critical_from
            ));
        }

        let age = &self.biological_age;
        if !(age.severity_midpoint.is_finite() && age.years_per_severity.is_finite()) {
            return invalid("biological age parameters must be finite".into());
        }

        for rule in &self.patterns {
            if rule.name.trim().is_empty() {
                return invalid("pattern rule without a name".into());
            }
            if rule.watchlist.is_empty() {
                return invalid(format!("pattern {} has an empty watchlist", rule.name));
            }
            if rule.min_abnormal == 0 {
                return invalid(format!("pattern {} must require at least one abnormal marker", rule.name));
            }
            if let Some(trigger) = &rule.trigger_codes {
                if let Some(stray) = trigger.iter().find(|code| !rule.watches(code)) {
                    return invalid(format!(
                        "pattern {} trigger code {stray} is not on its watchlist",
                        rule.name
                    ));
                }
            }
        }

        Ok(())
    }

    /// Weight for a category; unknown categories get the default weight.
    pub fn weight_for(&self, category: &MarkerCategory) -> f64 {
        self.category_weights
            .get(category.as_str())
            .copied()
            .unwrap_or(self.default_weight)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ScoringError> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path)
        .map_err(|e| ScoringError::ReferenceDataLoad(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| ScoringError::ReferenceDataParse(file.into(), e.to_string()))
}

fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<(), ScoringError> {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ScoringError::ReferenceDataParse(file.into(), e.to_string()))?;
    std::fs::write(&path, json)
        .map_err(|e| ScoringError::ReferenceDataLoad(path.display().to_string(), e.to_string()))
}

/// The seven co-occurrence rules. Every rule needs more than one abnormal
/// trigger marker, including the two-marker Liver Stress and Thyroid rules.
fn builtin_patterns() -> Vec<PatternRule> {
    vec![
        PatternRule::simple(
            "Chronic Inflammation",
            &["CRP", "IL6", "TNF_ALPHA", "FIBRINOGEN"],
            "Multiple inflammatory markers elevated, indicating chronic inflammatory state",
        ),
        PatternRule::simple(
            "Metabolic Syndrome",
            &["GLUCOSE", "HBA1C", "INSULIN", "TRIG", "HDL"],
            "Multiple metabolic markers abnormal, indicating metabolic dysregulation",
        ),
        // Triggered by INSULIN/HOMA_IR alone; GLUCOSE only joins the severity.
        PatternRule {
            name: "Insulin Resistance".into(),
            description: "Insulin resistance detected, indicating impaired glucose metabolism".into(),
            watchlist: vec!["INSULIN".into(), "HOMA_IR".into(), "GLUCOSE".into()],
            trigger_codes: Some(vec!["INSULIN".into(), "HOMA_IR".into()]),
            min_abnormal: default_min_abnormal(),
        },
        PatternRule::simple(
            "Cardiovascular Risk",
            &["LDL", "TRIG", "APOB", "CRP"],
            "Multiple cardiovascular markers elevated, indicating increased heart disease risk",
        ),
        PatternRule::simple(
            "Liver Stress",
            &["ALT", "GGT"],
            "Liver enzyme elevation detected, indicating hepatic stress or dysfunction",
        ),
        PatternRule::simple(
            "Vitamin Deficiency",
            &["VITD3", "B12", "FERRITIN"],
            "Vitamin/mineral deficiencies detected, requiring supplementation",
        ),
        PatternRule::simple(
            "Thyroid Dysfunction",
            &["TSH", "T3"],
            "Thyroid hormone imbalance detected, affecting metabolism",
        ),
    ]
}
