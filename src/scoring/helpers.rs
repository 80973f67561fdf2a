use crate::models::ClassifiedMarker;

/// Round to two decimal places, the precision every reported score uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of marker severities. `None` for an empty slice.
pub fn mean_severity<'a, I>(markers: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ClassifiedMarker>,
{
    let (sum, count) = markers
        .into_iter()
        .fold((0u32, 0usize), |(sum, count), m| (sum + u32::from(m.severity), count + 1));
    if count == 0 {
        None
    } else {
        Some(f64::from(sum) / count as f64)
    }
}

/// Format a threshold the way it was written: `40` rather than `40.0`.
pub fn format_threshold(value: f64) -> String {
    format!("{}", value)
}
