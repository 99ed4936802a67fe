//! Spectrogram generation
//!
//! Slides a Hann-tapered window over the signal, transforms each segment,
//! resamples its dB spectrum to a fixed number of rows and stacks the
//! segments as columns of a time-frequency image.

use crate::colormap::SPECTROGRAM_COLORMAP;
use crate::signal::Signal;
use crate::spectrum::{floor_db, SpectralAnalyzer};
use crate::utils::{linspace, normalize_peak, resample_linear};
use crate::window::{apply_window, hann};
use crate::{PlotError, Result};
use serde::{Deserialize, Serialize};

/// Number of frequency rows in a spectrogram image
pub const DEFAULT_RESOLUTION: usize = 512;

/// Spectrogram parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Hop between segment starts is derived from this size
    pub segment_size: usize,
    /// Window length in segments
    pub overlap_factor: usize,
    /// Rescale the signal to unit peak before analysis
    pub normalize: bool,
    /// Lower display bound in dB
    pub vmin: f64,
    /// Upper display bound in dB
    pub vmax: f64,
    /// Number of frequency rows in the output image
    pub resolution: usize,
    /// Name of the colormap the renderer should use
    pub colormap: String,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            segment_size: 512,
            overlap_factor: 8,
            normalize: false,
            vmin: -160.0,
            vmax: 0.0,
            resolution: DEFAULT_RESOLUTION,
            colormap: SPECTROGRAM_COLORMAP.to_string(),
        }
    }
}

impl SpectrogramConfig {
    /// Check parameters independent of any particular signal
    pub fn validate(&self) -> Result<()> {
        if self.segment_size == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Segment size must be positive".to_string(),
            ));
        }
        if self.overlap_factor == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Overlap factor must be positive".to_string(),
            ));
        }
        if self.window_length() < 2 {
            return Err(PlotError::InvalidConfiguration(format!(
                "Window of {} x {} samples is too short for a spectrum",
                self.segment_size, self.overlap_factor
            )));
        }
        if self.resolution == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Spectrogram resolution must be positive".to_string(),
            ));
        }
        if !(self.vmin < self.vmax) {
            return Err(PlotError::InvalidConfiguration(format!(
                "vmin ({}) must be below vmax ({})",
                self.vmin, self.vmax
            )));
        }
        Ok(())
    }

    /// Length of each analysis window in samples
    pub fn window_length(&self) -> usize {
        self.segment_size * self.overlap_factor
    }

    /// Number of segments a signal of `signal_len` samples is divided into
    ///
    /// The image has `segment_count - overlap_factor` columns, so at least
    /// one more segment than the overlap factor is required.
    pub fn segment_count(&self, signal_len: usize) -> Result<usize> {
        let window_length = self.window_length();
        if signal_len < window_length {
            return Err(PlotError::InsufficientSamples(format!(
                "Signal has {} samples, a window needs {}",
                signal_len, window_length
            )));
        }

        let segments = (signal_len / self.segment_size).saturating_sub(1);
        if segments <= self.overlap_factor {
            return Err(PlotError::InsufficientSamples(format!(
                "Signal of {} samples yields {} segments of {}, more than the overlap factor {} are needed",
                signal_len, segments, self.segment_size, self.overlap_factor
            )));
        }
        Ok(segments)
    }

    /// Number of image columns for a signal of `signal_len` samples
    pub fn column_count(&self, signal_len: usize) -> Result<usize> {
        Ok(self.segment_count(signal_len)? - self.overlap_factor)
    }
}

/// Data extent of the image along both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    /// Time range in seconds
    pub time: (f64, f64),
    /// Frequency range in Hz
    pub frequency: (f64, f64),
}

/// Time-frequency image of floored dB magnitudes
///
/// Rows are frequency (increasing with index), columns are time segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrogram {
    data: Vec<Vec<f64>>,
    num_rows: usize,
    num_columns: usize,
    pub extent: Extent,
    pub vmin: f64,
    pub vmax: f64,
    pub colormap: String,
}

impl Spectrogram {
    /// Compute the spectrogram of `signal`
    pub fn compute(signal: &Signal, config: &SpectrogramConfig) -> Result<Self> {
        config.validate()?;
        if signal.sample_rate() == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Sample rate must be positive".to_string(),
            ));
        }

        let signal_len = signal.len();
        let segments = config.segment_count(signal_len)?;
        let num_columns = config.column_count(signal_len)?;
        let window_length = config.window_length();

        log::debug!(
            "Spectrogram: {} samples, {} segments, window length {}",
            signal_len,
            segments,
            window_length
        );

        let mut samples = signal.samples().to_vec();
        if config.normalize {
            normalize_peak(&mut samples);
        }

        let window = hann(window_length);
        let analyzer = SpectralAnalyzer::new(window_length)?;
        let mut block = vec![0.0; window_length];
        let mut columns = Vec::with_capacity(num_columns);

        for segment in 0..num_columns {
            let offset = segment * signal_len / segments;
            block.copy_from_slice(&samples[offset..offset + window_length]);
            apply_window(&mut block, &window);

            let spectrum = analyzer.transform(&block, true)?;
            let mut column = resample_linear(&spectrum.magnitude_db(), config.resolution);
            floor_db(&mut column);
            columns.push(column);
        }

        let mut data = vec![vec![0.0; num_columns]; config.resolution];
        for (col, column) in columns.iter().enumerate() {
            for (row, &value) in column.iter().enumerate() {
                data[row][col] = value;
            }
        }

        log::info!(
            "Spectrogram computed: {} rows x {} columns",
            config.resolution,
            num_columns
        );

        Ok(Self {
            data,
            num_rows: config.resolution,
            num_columns,
            extent: Extent {
                time: (0.0, signal.duration()),
                frequency: (0.0, signal.nyquist()),
            },
            vmin: config.vmin,
            vmax: config.vmax,
            colormap: config.colormap.clone(),
        })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_columns)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.data.get(row).and_then(|r| r.get(column)).copied()
    }

    /// One time segment, low frequency first
    pub fn column(&self, column: usize) -> Option<Vec<f64>> {
        if column >= self.num_columns {
            return None;
        }
        Some(self.data.iter().map(|row| row[column]).collect())
    }

    /// Start time of each column in seconds
    pub fn time_axis(&self) -> Vec<f64> {
        linspace(self.extent.time.0, self.extent.time.1, self.num_columns)
    }

    /// Frequency of each row in Hz
    pub fn frequency_axis(&self) -> Vec<f64> {
        linspace(
            self.extent.frequency.0,
            self.extent.frequency.1,
            self.num_rows,
        )
    }

    /// Map a dB value to [0, 1] between `vmin` and `vmax`
    pub fn normalize_value(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

/// Rasterise spectrograms through a colormap
#[cfg(feature = "image")]
pub mod image {
    use super::*;
    use crate::colormap::Colormap;
    use ::image::imageops::{self, FilterType};
    use ::image::{ImageBuffer, Rgb, RgbImage};
    use std::path::Path;

    /// Options for spectrogram image generation
    pub struct SpectrogramImageOptions {
        /// Width of the output image in pixels, native column count if `None`
        pub width: Option<u32>,
        /// Height of the output image in pixels, native row count if `None`
        pub height: Option<u32>,
        /// Resampling filter used when resizing
        pub filter: FilterType,
    }

    impl Default for SpectrogramImageOptions {
        fn default() -> Self {
            Self {
                width: Some(1000),
                height: Some(600),
                filter: FilterType::CatmullRom,
            }
        }
    }

    /// One pixel per cell, low frequencies at the bottom
    pub fn render_native(spectrogram: &Spectrogram, colormap: &Colormap) -> RgbImage {
        let (rows, columns) = spectrogram.shape();
        let mut img = ImageBuffer::new(columns as u32, rows as u32);

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let row = rows - 1 - y as usize;
            let value = spectrogram.data[row][x as usize];
            let color = colormap.lookup(spectrogram.normalize_value(value));
            *pixel = Rgb(color.to_rgb8());
        }

        img
    }

    /// Generate a spectrogram image
    pub fn generate_spectrogram_image(
        spectrogram: &Spectrogram,
        colormap: &Colormap,
        options: &SpectrogramImageOptions,
    ) -> Result<RgbImage> {
        let (rows, columns) = spectrogram.shape();
        if rows == 0 || columns == 0 {
            return Err(PlotError::InsufficientSamples(
                "Spectrogram has no cells to render".to_string(),
            ));
        }

        let native = render_native(spectrogram, colormap);
        let width = options.width.unwrap_or(columns as u32).max(1);
        let height = options.height.unwrap_or(rows as u32).max(1);

        if (width, height) == native.dimensions() {
            return Ok(native);
        }

        log::debug!(
            "Resizing spectrogram image from {}x{} to {}x{}",
            columns,
            rows,
            width,
            height
        );
        Ok(imageops::resize(&native, width, height, options.filter))
    }

    /// Save a spectrogram to an image file
    pub fn save_spectrogram<P: AsRef<Path>>(
        spectrogram: &Spectrogram,
        colormap: &Colormap,
        path: P,
        options: &SpectrogramImageOptions,
    ) -> Result<()> {
        let img = generate_spectrogram_image(spectrogram, colormap, options)?;
        img.save(path.as_ref()).map_err(|e| {
            PlotError::InvalidConfiguration(format!(
                "Failed to save spectrogram image {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

}
