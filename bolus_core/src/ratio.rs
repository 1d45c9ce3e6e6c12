//! Insulin:carb ratio notation.
//!
//! Users read and write ratios as "U:G" (U units of insulin cover G grams of
//! carbohydrate). Arithmetic uses units per gram, `U / G`, so the hot path
//! multiplies instead of divides.
//!
//! `format` rounds grams-per-unit to an integer, so the mapping is lossy.
//! Up to 2 units per gram `format(parse(format(x)))` is stable, while
//! `parse(format(x))` can differ from `x` by one rounding step on `1 / x`.

/// Parse "U:G" (or an already-normalized float) into units per gram.
///
/// Returns `None` on any parse failure, on a non-positive denominator, and on
/// a non-finite result. Never panics.
pub fn parse(text: &str) -> Option<f32> {
    let text = text.trim();
    match text.split_once(':') {
        Some((units, grams)) => {
            let units: f32 = units.trim().parse().ok()?;
            let grams: f32 = grams.trim().parse().ok()?;
            if grams.is_nan() || grams <= 0.0 {
                return None;
            }
            let ratio = units / grams;
            ratio.is_finite().then_some(ratio)
        }
        None => {
            let ratio: f32 = text.parse().ok()?;
            ratio.is_finite().then_some(ratio)
        }
    }
}

/// Format units per gram as "1:N" with N = round(1 / ratio).
///
/// Returns `None` for absent, non-positive or non-finite ratios. Ratios above
/// 2 units per gram format as "1:0", which `parse` does not accept back.
pub fn format(ratio: Option<f32>) -> Option<String> {
    let ratio = ratio?;
    if !(ratio.is_finite() && ratio > 0.0) {
        return None;
    }
    // Saturates for subnormal ratios where 1 / ratio overflows.
    let carbs_per_unit = (1.0 / ratio).round() as u64;
    Some(format!("1:{carbs_per_unit}"))
}
