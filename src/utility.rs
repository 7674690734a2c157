//! Small numeric helpers shared across the crate.

/// Round `val` to `decimals` places, used when flattening results into records.
#[inline]
pub(crate) fn round_to(val: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (val * scale).round() / scale
}

/// Pressures from `bottom` down to (but not including) `top` every `step`.
pub(crate) fn pressure_grid(bottom: f64, top: f64, step: f64) -> Vec<f64> {
    debug_assert!(step > 0.0);

    (0u32..)
        .map(|i| bottom - f64::from(i) * step)
        .take_while(|&p| p > top)
        .collect()
}
