//! Threshold classification, severity mapping and reference-range text.
//!
//! Everything here is a pure function of its arguments: the same value,
//! thresholds and direction always produce the same status.

use std::str::FromStr;

use crate::models::enums::MarkerStatus;
use crate::models::{ClassifiedMarker, MarkerInput, Thresholds};

use super::helpers::format_threshold;
use super::types::ScoringError;

/// Check that the triple is ordered toward increasing badness.
///
/// Higher-is-worse markers need `elevated < high < critical`; lower-is-worse
/// markers need `elevated > high > critical`. Non-finite thresholds never pass.
pub fn validate_thresholds(thresholds: &Thresholds, lower_is_worse: bool) -> Result<(), ScoringError> {
    let Thresholds {
        elevated,
        high,
        critical,
    } = *thresholds;

    let finite = elevated.is_finite() && high.is_finite() && critical.is_finite();
    let ordered = if lower_is_worse {
        elevated > high && high > critical
    } else {
        elevated < high && high < critical
    };

    if finite && ordered {
        Ok(())
    } else {
        Err(ScoringError::InvalidThresholdOrdering {
            direction: if lower_is_worse {
                "lower-is-worse"
            } else {
                "higher-is-worse"
            },
            elevated,
            high,
            critical,
        })
    }
}

/// Classify a value against its thresholds.
///
/// Comparisons are strict: a value sitting exactly on a threshold lands in
/// the better band.
pub fn classify(
    value: f64,
    thresholds: &Thresholds,
    lower_is_worse: bool,
) -> Result<MarkerStatus, ScoringError> {
    if !value.is_finite() {
        return Err(ScoringError::NonFiniteValue(value));
    }
    validate_thresholds(thresholds, lower_is_worse)?;

    let status = if lower_is_worse {
        if value < thresholds.critical {
            MarkerStatus::Critical
        } else if value < thresholds.high {
            MarkerStatus::High
        } else if value < thresholds.elevated {
            MarkerStatus::Elevated
        } else {
            MarkerStatus::Normal
        }
    } else if value > thresholds.critical {
        MarkerStatus::Critical
    } else if value > thresholds.high {
        MarkerStatus::High
    } else if value > thresholds.elevated {
        MarkerStatus::Elevated
    } else {
        MarkerStatus::Normal
    };

    Ok(status)
}

/// NORMAL=0, ELEVATED=3, HIGH=6, CRITICAL=9.
pub fn severity_of(status: MarkerStatus) -> u8 {
    match status {
        MarkerStatus::Normal => 0,
        MarkerStatus::Elevated => 3,
        MarkerStatus::High => 6,
        MarkerStatus::Critical => 9,
    }
}

/// Severity for a status label arriving as text (e.g. from a stored report).
/// Case-insensitive; anything outside the four statuses is an error, never 0.
///
/// Library entry point for callers that hold status text; the engine itself
/// only handles typed `MarkerStatus` values.
pub fn severity_for_label(label: &str) -> Result<u8, ScoringError> {
    let status = MarkerStatus::from_str(&label.trim().to_uppercase())
        .map_err(|_| ScoringError::UnknownStatus(label.to_string()))?;
    Ok(severity_of(status))
}

/// Human-readable optimal range, anchored on the elevated threshold.
pub fn reference_range(thresholds: &Thresholds, lower_is_worse: bool) -> String {
    if lower_is_worse {
        format!(">{}", format_threshold(thresholds.elevated))
    } else {
        format!("0-{}", format_threshold(thresholds.elevated))
    }
}

/// Classify one raw marker into its derived form.
pub fn classify_marker(marker: &MarkerInput) -> Result<ClassifiedMarker, ScoringError> {
    let status = classify(marker.value, &marker.thresholds, marker.lower_is_worse)?;
    Ok(ClassifiedMarker {
        marker: marker.clone(),
        status,
        severity: severity_of(status),
        reference_range: reference_range(&marker.thresholds, marker.lower_is_worse),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::enums::MarkerCategory;
    use crate::scoring::helpers::test_support::raw;

    fn crp_thresholds() -> Thresholds {
        Thresholds::new(3.5, 10.0, 20.0)
    }

    fn hdl_thresholds() -> Thresholds {
        Thresholds::new(40.0, 30.0, 20.0)
    }

    /// CRP 4.2 is above elevated but not above high.
    #[test]
    fn crp_just_above_elevated_is_elevated() {
        let marker = raw("CRP", MarkerCategory::Inflammation, 4.2, crp_thresholds());
        let classified = classify_marker(&marker).unwrap();
        assert_eq!(classified.status, MarkerStatus::Elevated);
        assert_eq!(classified.severity, 3);
        assert_eq!(classified.reference_range, "0-3.5");
    }

    /// HDL 55 is not below 40, so it is normal.
    #[test]
    fn hdl_above_elevated_is_normal() {
        let mut marker = raw("HDL", MarkerCategory::Cardiovascular, 55.0, hdl_thresholds());
        marker.lower_is_worse = true;
        let classified = classify_marker(&marker).unwrap();
        assert_eq!(classified.status, MarkerStatus::Normal);
        assert_eq!(classified.severity, 0);
        assert_eq!(classified.reference_range, ">40");
    }

    #[test]
    fn higher_is_worse_bands() {
        let t = crp_thresholds();
        assert_eq!(classify(1.0, &t, false).unwrap(), MarkerStatus::Normal);
        assert_eq!(classify(5.0, &t, false).unwrap(), MarkerStatus::Elevated);
        assert_eq!(classify(15.0, &t, false).unwrap(), MarkerStatus::High);
        assert_eq!(classify(25.0, &t, false).unwrap(), MarkerStatus::Critical);
    }

    #[test]
    fn lower_is_worse_bands() {
        let t = hdl_thresholds();
        assert_eq!(classify(45.0, &t, true).unwrap(), MarkerStatus::Normal);
        assert_eq!(classify(35.0, &t, true).unwrap(), MarkerStatus::Elevated);
        assert_eq!(classify(25.0, &t, true).unwrap(), MarkerStatus::High);
        assert_eq!(classify(10.0, &t, true).unwrap(), MarkerStatus::Critical);
    }

    #[test]
    fn values_on_a_threshold_fall_in_the_better_band() {
        let t = crp_thresholds();
        assert_eq!(classify(3.5, &t, false).unwrap(), MarkerStatus::Normal);
        assert_eq!(classify(10.0, &t, false).unwrap(), MarkerStatus::Elevated);
        assert_eq!(classify(20.0, &t, false).unwrap(), MarkerStatus::High);

        let t = hdl_thresholds();
        assert_eq!(classify(40.0, &t, true).unwrap(), MarkerStatus::Normal);
        assert_eq!(classify(30.0, &t, true).unwrap(), MarkerStatus::Elevated);
        assert_eq!(classify(20.0, &t, true).unwrap(), MarkerStatus::High);
    }

    #[test]
    fn misordered_thresholds_are_rejected() {
        let err = classify(5.0, &Thresholds::new(10.0, 5.0, 20.0), false).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidThresholdOrdering {
                direction: "higher-is-worse",
                ..
            }
        ));

        // Ascending triple with lower-is-worse is a direction mismatch.
        let err = classify(5.0, &crp_thresholds(), true).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidThresholdOrdering {
                direction: "lower-is-worse",
                ..
            }
        ));
    }

    #[test]
    fn equal_thresholds_are_rejected() {
        assert!(validate_thresholds(&Thresholds::new(5.0, 5.0, 10.0), false).is_err());
        assert!(validate_thresholds(&Thresholds::new(10.0, 5.0, 5.0), true).is_err());
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert!(matches!(
            classify(f64::NAN, &crp_thresholds(), false),
            Err(ScoringError::NonFiniteValue(_))
        ));
        assert!(matches!(
            classify(f64::INFINITY, &crp_thresholds(), false),
            Err(ScoringError::NonFiniteValue(_))
        ));
        assert!(validate_thresholds(&Thresholds::new(1.0, 2.0, f64::INFINITY), false).is_err());
    }

    #[test]
    fn severity_map_is_exact() {
        assert_eq!(severity_of(MarkerStatus::Normal), 0);
        assert_eq!(severity_of(MarkerStatus::Elevated), 3);
        assert_eq!(severity_of(MarkerStatus::High), 6);
        assert_eq!(severity_of(MarkerStatus::Critical), 9);
    }

    #[test]
    fn severity_for_label_is_case_insensitive() {
        assert_eq!(severity_for_label("HIGH").unwrap(), 6);
        assert_eq!(severity_for_label("Elevated").unwrap(), 3);
        assert_eq!(severity_for_label(" critical ").unwrap(), 9);
    }

    #[test]
    fn severity_for_unknown_label_fails() {
        assert_eq!(
            severity_for_label("BORDERLINE").unwrap_err(),
            ScoringError::UnknownStatus("BORDERLINE".into())
        );
        assert!(severity_for_label("").is_err());
    }

    #[test]
    fn reference_range_formats() {
        assert_eq!(reference_range(&Thresholds::new(1.2, 2.0, 4.0), false), "0-1.2");
        assert_eq!(reference_range(&Thresholds::new(90.0, 60.0, 30.0), true), ">90");
    }

    #[test]
    fn classification_is_repeatable() {
        let marker = raw("GLUCOSE", MarkerCategory::Metabolism, 240.0, Thresholds::new(100.0, 126.0, 200.0));
        let first = classify_marker(&marker).unwrap();
        let second = classify_marker(&marker).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, MarkerStatus::Critical);
    }

    fn ascending_thresholds() -> impl Strategy<Value = Thresholds> {
        (0.0..1000.0f64, 0.01..500.0f64, 0.01..500.0f64)
            .prop_map(|(e, dh, dc)| Thresholds::new(e, e + dh, e + dh + dc))
    }

    proptest! {
        /// A value exactly on the elevated threshold is normal; just above it is not.
        #[test]
        fn elevated_boundary_is_inclusive_low(t in ascending_thresholds()) {
            prop_assert_eq!(classify(t.elevated, &t, false).unwrap(), MarkerStatus::Normal);
            let above = t.elevated + (t.high - t.elevated) / 2.0;
            prop_assert_eq!(classify(above, &t, false).unwrap(), MarkerStatus::Elevated);
        }

        /// Raising the value never improves a higher-is-worse status.
        #[test]
        fn status_is_monotonic_in_value(
            t in ascending_thresholds(),
            a in -100.0..2000.0f64,
            b in -100.0..2000.0f64,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = classify(lo, &t, false).unwrap();
            let s_hi = classify(hi, &t, false).unwrap();
            prop_assert!(s_lo <= s_hi, "{} -> {:?} but {} -> {:?}", lo, s_lo, hi, s_hi);
        }

        /// Severity always agrees with the status it was derived from.
        #[test]
        fn severity_tracks_status(t in ascending_thresholds(), v in -100.0..2000.0f64) {
            let marker = raw("X", MarkerCategory::Metabolism, v, t);
            let classified = classify_marker(&marker).unwrap();
            prop_assert_eq!(classified.severity, severity_of(classified.status));
        }
    }
}
