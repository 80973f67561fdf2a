// Per-marker validation ahead of scoring.
// A malformed element is rejected first. Otherwise, per marker: duplicate code,
// then non-finite value, then threshold ordering.
// A rejected marker never aborts the patient; it is reported and left out of every aggregate.

use std::collections::HashSet;

use crate::models::{ClassifiedMarker, MarkerEntry};

use super::classify::classify_marker;
use super::types::{RejectedMarker, ScoringError};

/// Markers split into those that classified cleanly and those that did not.
#[derive(Debug, Clone, Default)]
pub struct ValidatedMarkers {
    /// Input order preserved.
    pub accepted: Vec<ClassifiedMarker>,
    pub rejected: Vec<RejectedMarker>,
}

/// Classify every marker of one patient, rejecting the invalid ones.
///
/// The first well-formed occurrence of a code wins; later duplicates are
/// rejected without being classified. Malformed elements do not claim a code.
pub fn classify_marker_set(entries: &[MarkerEntry], participant_code: &str) -> ValidatedMarkers {
    let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());
    let mut result = ValidatedMarkers {
        accepted: Vec::with_capacity(entries.len()),
        rejected: Vec::new(),
    };

    for (index, entry) in entries.iter().enumerate() {
        let marker = match entry {
            MarkerEntry::Valid(marker) => marker,
            MarkerEntry::Malformed { code, error, .. } => {
                let code = code.clone().unwrap_or_else(|| format!("#{index}"));
                if let Some(rejected) = reject(code, &ScoringError::MalformedMarker(error.clone())) {
                    result.rejected.push(rejected);
                }
                continue;
            }
        };

        let outcome = if seen.insert(marker.code.as_str()) {
            classify_marker(marker)
        } else {
            Err(ScoringError::DuplicateMarkerCode(marker.code.clone()))
        };

        match outcome {
            Ok(classified) => result.accepted.push(classified),
            Err(e) => {
                if let Some(rejected) = reject(marker.code.clone(), &e) {
                    result.rejected.push(rejected);
                }
            }
        }
    }

    if !result.rejected.is_empty() {
        tracing::warn!(
            participant = %participant_code,
            rejected = result.rejected.len(),
            accepted = result.accepted.len(),
            "Markers rejected during validation"
        );
    }

    result
}

fn reject(code: String, error: &ScoringError) -> Option<RejectedMarker> {
    let kind = error.rejection_kind()?;
    tracing::warn!(code = %code, error = %error, "Marker rejected");
    Some(RejectedMarker {
        code,
        error: kind,
        message: error.to_string(),
    })
}
