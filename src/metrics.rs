//! Metrics.
//!
//! Evaluation helpers shared by the network and the nearest-neighbour
//! classifier. They do not participate in backprop.

/// 1-based index of the largest value, ties going to the first occurrence.
///
/// Returns `None` for an empty input.
pub fn predicted_class<I>(outputs: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, value) in outputs.into_iter().enumerate() {
        let better = match best {
            None => true,
            Some((_, max)) => value > max,
        };
        if better {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i + 1)
}

/// Percentage of correctly classified cases, `100 * hits / total`.
///
/// Returns `0` when `total == 0`.
#[inline]
pub fn hit_percentage(hits: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * hits as f64 / total as f64
}
