use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{AgeTrend, AgeUnavailableReason, RejectionKind, RiskLevel};
use crate::models::{ClassifiedMarker, Participant, PatientInput};

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

/// A detected multi-marker condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    /// Codes of the abnormal markers the severity was averaged over.
    pub markers_affected: Vec<String>,
    pub severity: f64,
    pub trigger_count: usize,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRisk {
    pub average_severity: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub markers_count: usize,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk_score: f64,
    pub risk_category: RiskLevel,
    pub total_weighted_score: f64,
    pub total_weight: f64,
    /// Keyed by category display name; BTreeMap keeps output byte-stable.
    pub category_risks: BTreeMap<String, CategoryRisk>,
}

// ---------------------------------------------------------------------------
// Biological age
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiologicalAgeEstimate {
    pub chronological_age: u32,
    pub avg_severity: f64,
    pub age_delta: f64,
    pub biological_age: f64,
    pub trend: AgeTrend,
}

// ---------------------------------------------------------------------------
// Summary & rejections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MarkerSummary {
    pub total_markers: usize,
    pub normal_count: usize,
    pub elevated_count: usize,
    pub high_count: usize,
    pub critical_count: usize,
    pub rejected_count: usize,
}

impl MarkerSummary {
    pub fn abnormal_count(&self) -> usize {
        self.elevated_count + self.high_count + self.critical_count
    }
}

/// A marker that could not be classified. Excluded from every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedMarker {
    pub code: String,
    pub error: RejectionKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// PatientAnalysis & AnalysisReport
// ---------------------------------------------------------------------------

/// The complete structured result for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAnalysis {
    pub participant: Participant,
    pub summary: MarkerSummary,
    pub markers: Vec<ClassifiedMarker>,
    pub rejected_markers: Vec<RejectedMarker>,
    /// Sorted by severity, highest first.
    pub patterns: Vec<Pattern>,
    pub risk_assessment: RiskAssessment,
    pub biological_age: Option<BiologicalAgeEstimate>,
    pub biological_age_unavailable: Option<AgeUnavailableReason>,
}

/// Envelope for a batch of analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_patients: usize,
    pub patients: Vec<PatientAnalysis>,
}

// ---------------------------------------------------------------------------
// ScoringError
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error(
        "Invalid threshold ordering ({direction}): elevated={elevated}, high={high}, critical={critical}"
    )]
    InvalidThresholdOrdering {
        direction: &'static str,
        elevated: f64,
        high: f64,
        critical: f64,
    },

    #[error("Marker value is not a finite number: {0}")]
    NonFiniteValue(f64),

    #[error("Duplicate marker code: {0}")]
    DuplicateMarkerCode(String),

    #[error("Malformed marker: {0}")]
    MalformedMarker(String),

    #[error("Unknown marker status: {0}")]
    UnknownStatus(String),

    #[error("Chronological age is required for a biological age estimate")]
    MissingChronologicalAge,

    #[error("No classified markers available")]
    EmptyMarkerSet,

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Invalid reference data: {0}")]
    InvalidReferenceData(String),
}

impl ScoringError {
    /// Tag used when this error rejects a single marker.
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            Self::InvalidThresholdOrdering { .. } => Some(RejectionKind::InvalidThresholdOrdering),
            Self::NonFiniteValue(_) => Some(RejectionKind::NonFiniteValue),
            Self::DuplicateMarkerCode(_) => Some(RejectionKind::DuplicateMarkerCode),
            Self::MalformedMarker(_) => Some(RejectionKind::MalformedMarker),
            _ => None,
        }
    }

    /// Reason recorded when this error makes the biological age unavailable.
    pub fn age_unavailable_reason(&self) -> Option<AgeUnavailableReason> {
        match self {
            Self::MissingChronologicalAge => Some(AgeUnavailableReason::MissingChronologicalAge),
            Self::EmptyMarkerSet => Some(AgeUnavailableReason::EmptyMarkerSet),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RiskEngine trait
// ---------------------------------------------------------------------------

/// The scoring engine. Implementations hold only read-only reference data,
/// so one engine can serve any number of patients concurrently.
pub trait RiskEngine: Send + Sync {
    /// Classify, aggregate and detect patterns for one patient.
    fn analyze_patient(&self, patient: &PatientInput) -> PatientAnalysis;

    /// Analyze every patient independently. Output order matches input order.
    fn analyze_batch(&self, patients: &[PatientInput]) -> AnalysisReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_summary_abnormal_count() {
        let summary = MarkerSummary {
            total_markers: 10,
            normal_count: 4,
            elevated_count: 3,
            high_count: 2,
            critical_count: 1,
            rejected_count: 2,
        };
        assert_eq!(summary.abnormal_count(), 6);
    }

    #[test]
    fn per_marker_errors_have_rejection_tags() {
        let ordering = ScoringError::InvalidThresholdOrdering {
            direction: "higher-is-worse",
            elevated: 10.0,
            high: 5.0,
            critical: 20.0,
        };
        assert_eq!(
            ordering.rejection_kind(),
            Some(RejectionKind::InvalidThresholdOrdering)
        );
        assert_eq!(
            ScoringError::NonFiniteValue(f64::NAN).rejection_kind(),
            Some(RejectionKind::NonFiniteValue)
        );
        assert_eq!(
            ScoringError::MalformedMarker("missing field `value`".into()).rejection_kind(),
            Some(RejectionKind::MalformedMarker)
        );
        assert_eq!(ScoringError::MissingChronologicalAge.rejection_kind(), None);
    }

    #[test]
    fn age_errors_map_to_unavailable_reasons() {
        assert_eq!(
            ScoringError::MissingChronologicalAge.age_unavailable_reason(),
            Some(AgeUnavailableReason::MissingChronologicalAge)
        );
        assert_eq!(
            ScoringError::EmptyMarkerSet.age_unavailable_reason(),
            Some(AgeUnavailableReason::EmptyMarkerSet)
        );
        assert_eq!(
            ScoringError::UnknownStatus("X".into()).age_unavailable_reason(),
            None
        );
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = ScoringError::DuplicateMarkerCode("CRP".into());
        assert_eq!(err.to_string(), "Duplicate marker code: CRP");
    }
}
