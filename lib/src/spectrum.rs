//! Single-block spectral transform
//!
//! Zero-pads a sample block, runs a forward real FFT, keeps the
//! non-negative half of the spectrum and converts it to floored decibel
//! magnitudes and wrapped phase in degrees.

use crate::utils::{bin_to_frequency, linspace};
use crate::{PlotError, Result};
use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Lowest magnitude reported, in dB
pub const DB_FLOOR: f64 = -300.0;

/// Phase values below this many degrees are shifted up by a full turn
pub const PHASE_REWRAP_BELOW: f64 = -179.0;

/// Lower edge of the displayed frequency range on an absolute-Hz axis
pub const MIN_DISPLAY_FREQUENCY: f64 = 10.0;

/// Convert a linear magnitude to dB, floored at `DB_FLOOR`
///
/// Zero, NaN and negative inputs map to the floor.
pub fn amplitude_to_db(magnitude: f64) -> f64 {
    let db = 20.0 * magnitude.log10();
    if db.is_nan() {
        DB_FLOOR
    } else {
        db.clamp(DB_FLOOR, f64::MAX)
    }
}

/// Clamp every value to `[DB_FLOOR, f64::MAX]`, replacing NaN by the floor
pub fn floor_db(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = if v.is_nan() {
            DB_FLOOR
        } else {
            v.clamp(DB_FLOOR, f64::MAX)
        };
    }
}

/// Frequency-axis convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyAxis {
    /// Fraction of Nyquist, `[0, 1)`
    Normalized,
    /// Absolute frequency, `[0, sample_rate / 2)`
    #[default]
    Hertz,
}

impl FrequencyAxis {
    /// X coordinate of each of `num_bins` half-spectrum bins
    pub fn values(&self, num_bins: usize, sample_rate: u32) -> Vec<f64> {
        match self {
            FrequencyAxis::Normalized => linspace(0.0, 1.0, num_bins),
            FrequencyAxis::Hertz => linspace(0.0, sample_rate as f64 / 2.0, num_bins),
        }
    }

    /// Default visible range of the axis
    pub fn limits(&self, sample_rate: u32) -> (f64, f64) {
        match self {
            FrequencyAxis::Normalized => (0.0, 1.0),
            FrequencyAxis::Hertz => (MIN_DISPLAY_FREQUENCY, sample_rate as f64 / 2.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FrequencyAxis::Normalized => "Normalized Frequency (\u{d7}\u{3c0} rad/sample)",
            FrequencyAxis::Hertz => "Frequency (Hz)",
        }
    }
}

/// Display window for phase values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseWindow {
    /// `[-180, 180]`
    #[default]
    Standard,
    /// `[-190, 190]`, leaves room for values at the wrap boundary
    Wide,
}

impl PhaseWindow {
    pub fn limits(&self) -> (f64, f64) {
        match self {
            PhaseWindow::Standard => (-180.0, 180.0),
            PhaseWindow::Wide => (-190.0, 190.0),
        }
    }
}

/// Parameters of a single spectral transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumConfig {
    /// Transform length; blocks are zero-padded up to it
    pub pad_width: usize,
    /// Scale bins by `1 / block_length`
    pub divide_by_length: bool,
    /// Sample position whose linear phase is removed before taking angles
    pub phase_reference: Option<f64>,
    /// Grow `pad_width` to the block length instead of rejecting longer blocks
    pub fit_pad_width: bool,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            pad_width: 1024,
            divide_by_length: false,
            phase_reference: None,
            fit_pad_width: false,
        }
    }
}

impl SpectrumConfig {
    /// Transform length that will be used for a block of `block_len` samples
    pub fn effective_pad_width(&self, block_len: usize) -> Result<usize> {
        if block_len <= self.pad_width {
            Ok(self.pad_width)
        } else if self.fit_pad_width {
            Ok(block_len)
        } else {
            Err(PlotError::InvalidConfiguration(format!(
                "Pad width {} is shorter than the block length {}",
                self.pad_width, block_len
            )))
        }
    }
}

/// Non-negative half of a zero-padded block spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Vec<Complex64>,
    block_len: usize,
    pad_width: usize,
}

impl Spectrum {
    pub fn bins(&self) -> &[Complex64] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn pad_width(&self) -> usize {
        self.pad_width
    }

    /// Frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize, sample_rate: u32) -> f64 {
        bin_to_frequency(k, sample_rate, self.pad_width)
    }

    /// Magnitude of each bin in dB, floored at `DB_FLOOR`
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.bins.iter().map(|c| amplitude_to_db(c.norm())).collect()
    }

    /// Phase of each bin in degrees
    ///
    /// With a reference sample the linear phase of a delay of that many
    /// samples is removed first. Values below `PHASE_REWRAP_BELOW` are moved
    /// up by 360 degrees.
    pub fn phase_degrees(&self, reference: Option<f64>) -> Vec<f64> {
        let n = self.pad_width as f64;
        self.bins
            .iter()
            .enumerate()
            .map(|(k, &bin)| {
                let bin = match reference {
                    Some(r) => bin * Complex64::from_polar(1.0, 2.0 * PI * k as f64 * r / n),
                    None => bin,
                };
                let degrees = bin.arg().to_degrees();
                if degrees < PHASE_REWRAP_BELOW {
                    degrees + 360.0
                } else {
                    degrees
                }
            })
            .collect()
    }

    /// Index of the strongest bin
    pub fn peak_bin(&self) -> Option<usize> {
        self.bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm_sqr().total_cmp(&b.1.norm_sqr()))
            .map(|(k, _)| k)
    }
}

/// Forward transform of a fixed length, reusable across blocks
pub struct SpectralAnalyzer {
    pad_width: usize,
    fft: Arc<dyn RealToComplex<f64>>,
}

impl SpectralAnalyzer {
    /// Plan a transform of length `pad_width`
    pub fn new(pad_width: usize) -> Result<Self> {
        if pad_width == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Pad width must be positive".to_string(),
            ));
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(pad_width);

        Ok(Self { pad_width, fft })
    }

    pub fn pad_width(&self) -> usize {
        self.pad_width
    }

    /// Transform one block, zero-padded to the planned length
    pub fn transform(&self, block: &[f64], divide_by_length: bool) -> Result<Spectrum> {
        if block.len() > self.pad_width {
            return Err(PlotError::InvalidConfiguration(format!(
                "Block of {} samples does not fit a transform of length {}",
                block.len(),
                self.pad_width
            )));
        }

        let mut input = self.fft.make_input_vec();
        input[..block.len()].copy_from_slice(block);
        let mut output = self.fft.make_output_vec();

        self.fft
            .process(&mut input, &mut output)
            .map_err(|e| PlotError::Transform(format!("FFT error: {}", e)))?;

        output.truncate(self.pad_width / 2);

        if divide_by_length && !block.is_empty() {
            let scale = 1.0 / block.len() as f64;
            for bin in output.iter_mut() {
                *bin *= scale;
            }
        }

        Ok(Spectrum {
            bins: output,
            block_len: block.len(),
            pad_width: self.pad_width,
        })
    }
}

/// Transform a single block according to `config`
pub fn analyze(block: &[f64], config: &SpectrumConfig) -> Result<Spectrum> {
    let pad_width = config.effective_pad_width(block.len())?;
    log::debug!(
        "Spectral transform: {} samples padded to {}",
        block.len(),
        pad_width
    );
    SpectralAnalyzer::new(pad_width)?.transform(block, config.divide_by_length)
}
