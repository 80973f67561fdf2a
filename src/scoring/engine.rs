use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use uuid::Uuid;

use crate::models::PatientInput;

use super::aggregate::{assess_risk, summarize};
use super::biological_age::estimate_biological_age;
use super::patterns::{detect_patterns, sort_by_severity};
use super::reference::ScoringReferenceData;
use super::types::{AnalysisReport, PatientAnalysis, RiskEngine};
use super::validation::classify_marker_set;

/// Default implementation of the risk engine.
/// Runs validation, classification, aggregation, pattern detection and the
/// biological age estimate against one set of reference tables.
pub struct DefaultRiskEngine {
    pub(crate) reference: ScoringReferenceData,
}

impl DefaultRiskEngine {
    pub fn new(reference: ScoringReferenceData) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ScoringReferenceData {
        &self.reference
    }
}

impl RiskEngine for DefaultRiskEngine {
    fn analyze_patient(&self, patient: &PatientInput) -> PatientAnalysis {
        let code = patient.participant.participant_code.as_str();
        let validated = classify_marker_set(&patient.markers, code);
        let markers = validated.accepted;

        let summary = summarize(&markers, validated.rejected.len());
        let risk_assessment = assess_risk(&markers, &self.reference);

        let mut patterns = detect_patterns(&markers, &self.reference.patterns);
        sort_by_severity(&mut patterns);

        let (biological_age, biological_age_unavailable) = match estimate_biological_age(
            &markers,
            patient.participant.chronological_age,
            &self.reference.biological_age,
        ) {
            Ok(estimate) => (Some(estimate), None),
            Err(e) => {
                tracing::debug!(participant = %code, reason = %e, "Biological age unavailable");
                (None, e.age_unavailable_reason())
            }
        };

        tracing::info!(
            participant = %code,
            markers = summary.total_markers,
            abnormal = summary.abnormal_count(),
            rejected = summary.rejected_count,
            patterns = patterns.len(),
            overall_risk = risk_assessment.overall_risk_score,
            risk_category = %risk_assessment.risk_category,
            "Patient analysis complete"
        );

        PatientAnalysis {
            participant: patient.participant.clone(),
            summary,
            markers,
            rejected_markers: validated.rejected,
            patterns,
            risk_assessment,
            biological_age,
            biological_age_unavailable,
        }
    }

    fn analyze_batch(&self, patients: &[PatientInput]) -> AnalysisReport {
        let start = Instant::now();

        let analyses: Vec<PatientAnalysis> = patients
            .par_iter()
            .map(|patient| self.analyze_patient(patient))
            .collect();

        let report = AnalysisReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total_patients: analyses.len(),
            patients: analyses,
        };

        tracing::info!(
            report_id = %report.report_id,
            patients = report.total_patients,
            processing_ms = start.elapsed().as_millis() as u64,
            "Batch analysis complete"
        );

        report
    }
}
