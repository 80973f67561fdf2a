use crate::models::enums::AgeTrend;
use crate::models::ClassifiedMarker;

use super::helpers::{mean_severity, round2};
use super::reference::BiologicalAgeParams;
use super::types::{BiologicalAgeEstimate, ScoringError};

/// Estimate biological age from the mean severity of all accepted markers.
///
/// `age_delta = (avg_severity - midpoint) * years_per_severity`. Outputs are
/// rounded to two decimals after the delta is computed from the unrounded mean.
pub fn estimate_biological_age(
    markers: &[ClassifiedMarker],
    chronological_age: Option<u32>,
    params: &BiologicalAgeParams,
) -> Result<BiologicalAgeEstimate, ScoringError> {
    let age = match chronological_age {
        Some(age) if age > 0 => age,
        _ => return Err(ScoringError::MissingChronologicalAge),
    };
    let avg = mean_severity(markers).ok_or(ScoringError::EmptyMarkerSet)?;

    let delta = (avg - params.severity_midpoint) * params.years_per_severity;
    let age_delta = round2(delta);

    Ok(BiologicalAgeEstimate {
        chronological_age: age,
        avg_severity: round2(avg),
        age_delta,
        biological_age: round2(f64::from(age) + delta),
        trend: trend_for(age_delta),
    })
}

fn trend_for(age_delta: f64) -> AgeTrend {
    if age_delta < 0.0 {
        AgeTrend::Younger
    } else if age_delta > 0.0 {
        AgeTrend::Older
    } else {
        AgeTrend::Matched
    }
}
