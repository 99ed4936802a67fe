//! Utility functions for signal handling and formatting
//!
//! Provides helper functions for loading signals, resampling and scaling
//! sample vectors, and formatting values for display.

use crate::audio_io::read_audio_file;
use crate::signal::Signal;
use crate::{PlotError, Result};

/// Load an audio file into a mono `Signal`
#[cfg(not(target_arch = "wasm32"))]
pub fn load_signal<P: AsRef<std::path::Path>>(path: P) -> Result<Signal> {
    match read_audio_file(path.as_ref()) {
        Ok((audio_info, signal)) => {
            log::info!(
                "Loaded audio: {} channels, {} Hz, {:.2}s",
                audio_info.channels,
                audio_info.sample_rate,
                audio_info.duration_seconds
            );
            Ok(signal)
        }
        Err(e) => Err(PlotError::InvalidConfiguration(format!(
            "Failed to load audio file {}: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Format a frequency value for display
pub fn format_frequency(freq_hz: f64) -> String {
    if freq_hz >= 1000.0 {
        format!("{:.2} kHz", freq_hz / 1000.0)
    } else {
        format!("{:.1} Hz", freq_hz)
    }
}

/// Format a time value for display
pub fn format_time(time_sec: f64) -> String {
    if time_sec >= 60.0 {
        let minutes = (time_sec / 60.0).floor();
        let seconds = time_sec % 60.0;
        format!("{:.0}m {:.1}s", minutes, seconds)
    } else {
        format!("{:.2}s", time_sec)
    }
}

/// Format duration in samples to time string
pub fn format_duration(samples: usize, sample_rate: u32) -> String {
    let seconds = samples as f64 / sample_rate as f64;
    format_time(seconds)
}

/// Calculate the frequency corresponding to a given FFT bin
pub fn bin_to_frequency(bin: usize, sample_rate: u32, fft_size: usize) -> f64 {
    bin as f64 * sample_rate as f64 / fft_size as f64
}

/// `count` evenly spaced values over `[start, stop)`, endpoint excluded
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let step = if count == 0 {
        0.0
    } else {
        (stop - start) / count as f64
    };
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Resample `data` to `new_len` points by linear interpolation
///
/// First and last samples map onto each other, so resampling to the same
/// length is the identity.
pub fn resample_linear(data: &[f64], new_len: usize) -> Vec<f64> {
    match (data.len(), new_len) {
        (_, 0) | (0, _) => return Vec::new(),
        (1, _) => return vec![data[0]; new_len],
        (_, 1) => return vec![data[0]],
        _ => {}
    }

    let last = data.len() - 1;
    let scale = last as f64 / (new_len - 1) as f64;

    (0..new_len)
        .map(|i| {
            let pos = i as f64 * scale;
            let left = (pos.floor() as usize).min(last);
            let right = (left + 1).min(last);
            let frac = pos - left as f64;
            data[left] + (data[right] - data[left]) * frac
        })
        .collect()
}

/// Largest absolute sample value, zero for an empty slice
pub fn peak_abs(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |peak, &x| peak.max(x.abs()))
}

/// Scale `data` so its peak absolute value becomes 1
///
/// Silent input is left as is.
pub fn normalize_peak(data: &mut [f64]) {
    let peak = peak_abs(data);
    if peak > 0.0 && peak.is_finite() {
        let gain = 1.0 / peak;
        for sample in data.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Smallest value in `data`, if any
pub fn min_value(data: &[f64]) -> Option<f64> {
    data.iter().copied().reduce(f64::min)
}
