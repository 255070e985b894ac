//! Rounding helpers shared by the evaluator and the statistics aggregator.
//!
//! All percentages and averages round half up (toward positive infinity),
//! so `-2.5` rounds to `-2` and `76.5` rounds to `77`.

/// Rounds half toward positive infinity.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `round(part / whole * 100)`, or `0` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let value = round_half_up(part as f64 / whole as f64 * 100.0);
    u32::try_from(value.clamp(0, 100)).unwrap_or(0)
}

/// Arithmetic mean, or `None` for an empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = u32>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0_u64, 0_u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Rounded mean of scores in `[0, 100]`, `0` when there are none.
#[must_use]
pub fn rounded_mean<I>(values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    mean(values)
        .map(round_half_up)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}
