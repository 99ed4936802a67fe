//! Taper applied to spectrogram segments
//!
//! Only the symmetric Hann window is provided: a raised cosine that is zero at
//! both ends and unity at the center.

use std::f64::consts::PI;

/// Generate a symmetric Hann window of the given size
pub fn hann(size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (size - 1) as f64;
            (0..size)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
                .collect()
        }
    }
}

/// Multiply `block` by `window` sample by sample
///
/// Samples beyond the window length are left untouched.
pub fn apply_window(block: &mut [f64], window: &[f64]) {
    for (sample, &w) in block.iter_mut().zip(window) {
        *sample *= w;
    }
}
