use crate::models::ClassifiedMarker;

use super::helpers::{mean_severity, round2};
use super::reference::PatternRule;
use super::types::Pattern;

/// Run every catalog rule over a patient's accepted markers.
///
/// Output follows catalog order; the engine reorders by severity.
pub fn detect_patterns(markers: &[ClassifiedMarker], catalog: &[PatternRule]) -> Vec<Pattern> {
    catalog
        .iter()
        .filter_map(|rule| evaluate_rule(markers, rule))
        .collect()
}

/// Evaluate one rule. `None` when fewer than `min_abnormal` trigger markers
/// are abnormal.
pub fn evaluate_rule(markers: &[ClassifiedMarker], rule: &PatternRule) -> Option<Pattern> {
    let trigger_count = markers
        .iter()
        .filter(|m| m.status.is_abnormal() && rule.counts_toward_trigger(m.code()))
        .count();
    if trigger_count < rule.min_abnormal {
        return None;
    }

    let affected: Vec<&ClassifiedMarker> = markers
        .iter()
        .filter(|m| m.status.is_abnormal() && rule.watches(m.code()))
        .collect();
    let severity = mean_severity(affected.iter().copied())?;

    Some(Pattern {
        name: rule.name.clone(),
        markers_affected: affected.iter().map(|m| m.code().to_string()).collect(),
        severity: round2(severity),
        trigger_count,
        description: rule.description.clone(),
    })
}

/// Highest severity first. Stable, so ties keep catalog order.
pub fn sort_by_severity(patterns: &mut [Pattern]) {
    patterns.sort_by(|a, b| b.severity.total_cmp(&a.severity));
}
