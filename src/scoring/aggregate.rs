use std::collections::BTreeMap;

use crate::models::enums::{MarkerCategory, MarkerStatus, RiskLevel};
use crate::models::ClassifiedMarker;

use super::helpers::{mean_severity, round2};
use super::reference::{OverallRiskBreakpoints, ScoringReferenceData};
use super::types::{CategoryRisk, MarkerSummary, RiskAssessment};

// ---------------------------------------------------------------------------
// Category aggregation
// ---------------------------------------------------------------------------

/// Group markers by category and score each group.
///
/// Only categories with at least one marker appear in the result.
pub fn aggregate_by_category(
    markers: &[ClassifiedMarker],
    reference: &ScoringReferenceData,
) -> BTreeMap<String, CategoryRisk> {
    let mut groups: BTreeMap<&str, (&MarkerCategory, Vec<&ClassifiedMarker>)> = BTreeMap::new();
    for marker in markers {
        let category = marker.category();
        groups
            .entry(category.as_str())
            .or_insert_with(|| (category, Vec::new()))
            .1
            .push(marker);
    }

    groups
        .into_iter()
        .filter_map(|(label, (category, members))| {
            let average = round2(mean_severity(members.iter().copied())?);
            let weight = reference.weight_for(category);
            Some((
                label.to_string(),
                CategoryRisk {
                    average_severity: average,
                    weight,
                    weighted_score: round2(average * weight),
                    markers_count: members.len(),
                    risk_level: reference.category_breakpoints.level_for(average),
                },
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Overall risk
// ---------------------------------------------------------------------------

/// Overall score for one patient, with the totals it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallRisk {
    pub score: f64,
    pub category: RiskLevel,
    pub total_weighted_score: f64,
    pub total_weight: f64,
}

/// Weighted mean of category severities.
///
/// The products are summed unrounded so the score does not pick up the
/// per-category rounding of `weighted_score`. No categories scores 0.
pub fn overall_risk(
    categories: &BTreeMap<String, CategoryRisk>,
    breakpoints: &OverallRiskBreakpoints,
) -> OverallRisk {
    let (weighted, weights) = categories.values().fold((0.0, 0.0), |(sum, total), risk| {
        (sum + risk.average_severity * risk.weight, total + risk.weight)
    });

    let score = if weights > 0.0 {
        round2(weighted / weights)
    } else {
        0.0
    };
    OverallRisk {
        score,
        category: breakpoints.category_for(score),
        total_weighted_score: round2(weighted),
        total_weight: round2(weights),
    }
}

/// Category breakdown plus overall score for one patient's accepted markers.
pub fn assess_risk(markers: &[ClassifiedMarker], reference: &ScoringReferenceData) -> RiskAssessment {
    let category_risks = aggregate_by_category(markers, reference);
    let overall = overall_risk(&category_risks, &reference.overall_breakpoints);

    RiskAssessment {
        overall_risk_score: overall.score,
        risk_category: overall.category,
        total_weighted_score: overall.total_weighted_score,
        total_weight: overall.total_weight,
        category_risks,
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Status counts over accepted markers.
pub fn summarize(markers: &[ClassifiedMarker], rejected_count: usize) -> MarkerSummary {
    markers.iter().fold(
        MarkerSummary {
            total_markers: markers.len(),
            rejected_count,
            ..MarkerSummary::default()
        },
        |mut summary, m| {
            match m.status {
                MarkerStatus::Normal => summary.normal_count += 1,
                MarkerStatus::Elevated => summary.elevated_count += 1,
                MarkerStatus::High => summary.high_count += 1,
                MarkerStatus::Critical => summary.critical_count += 1,
            }
            summary
        },
    )
}
