//! Dose rounding helpers.
//!
//! Insulin pens dose in half-unit steps. Doses are rounded in `f32` so the
//! result stays within a quarter unit of the input across the whole range.

// Every f32 at or above 2^23 is already an integer, hence a multiple of 0.5.
const EXACT_INTEGER_LIMIT: f32 = 8_388_608.0;

/// Round a dose to the nearest 0.5 unit (`round(x * 2) / 2`, half away from zero).
///
/// Non-finite input is returned unchanged; callers reject it before rounding.
#[inline]
pub fn round_to_half_unit(units: f32) -> f32 {
    if !units.is_finite() || units.abs() >= EXACT_INTEGER_LIMIT {
        return units;
    }
    (units * 2.0).round() / 2.0
}
