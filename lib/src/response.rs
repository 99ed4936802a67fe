//! Plot request orchestration
//!
//! Maps a `PlotConfig` and an input signal onto the arrays, labels, ticks
//! and limits each panel of a plot needs. The result is plain data for an
//! external renderer; nothing here draws.

use crate::colormap::{Colormap, ColormapRegistry, SPECTROGRAM_COLORMAP};
use crate::signal::{Signal, SignalInput};
use crate::spectrogram::{Spectrogram, SpectrogramConfig};
use crate::spectrum::{analyze, FrequencyAxis, PhaseWindow, Spectrum, SpectrumConfig};
use crate::ticks::TickSet;
use crate::utils::min_value;
use crate::{PlotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase de-rotation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PhaseArgRepr", into = "PhaseArgRepr")]
pub enum PhaseArg {
    /// Center of the block, `(block_len - 1) / 2`
    Auto,
    /// Explicit sample position
    Sample(f64),
}

impl PhaseArg {
    /// Reference sample for a block of `block_len` samples
    pub fn reference(&self, block_len: usize) -> f64 {
        match self {
            PhaseArg::Auto => (block_len as f64 - 1.0) / 2.0,
            PhaseArg::Sample(sample) => *sample,
        }
    }
}

impl FromStr for PhaseArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(PhaseArg::Auto);
        }
        match s.parse::<f64>() {
            Ok(sample) if sample.is_finite() => Ok(PhaseArg::Sample(sample)),
            _ => Err(format!(
                "Phase argument must be 'auto' or a sample position, got '{}'",
                s
            )),
        }
    }
}

impl fmt::Display for PhaseArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseArg::Auto => write!(f, "auto"),
            PhaseArg::Sample(sample) => write!(f, "{}", sample),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PhaseArgRepr {
    Sample(f64),
    Keyword(String),
}

impl TryFrom<PhaseArgRepr> for PhaseArg {
    type Error = String;

    fn try_from(repr: PhaseArgRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PhaseArgRepr::Sample(sample) => Ok(PhaseArg::Sample(sample)),
            PhaseArgRepr::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<PhaseArg> for PhaseArgRepr {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Auto => PhaseArgRepr::Keyword("auto".to_string()),
            PhaseArg::Sample(sample) => PhaseArgRepr::Sample(sample),
        }
    }
}

/// Options of a plot request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub title: String,
    /// Stack panels vertically (one per row) instead of side by side
    pub horizontal: bool,
    /// Frequency axis as a fraction of Nyquist instead of Hz
    pub normalized_freq: bool,
    /// Sample rate used for bare sample arrays
    pub sample_rate: u32,
    pub pad_width: usize,
    /// Grow the pad width to the block length when the block is longer
    pub fit_pad_width: bool,
    /// Logarithmic frequency axis with decade ticks (Hz axis only)
    pub log_freq: bool,
    pub freq_response: bool,
    pub phase_response: bool,
    /// Mark every amplitude sample with a dot
    pub dots: bool,
    pub divide_by_length: bool,
    /// Compute a spectrogram instead of response panels
    pub spectrogram: bool,
    pub segment_size: usize,
    pub overlap: usize,
    pub vmin: f64,
    pub vmax: f64,
    pub normalize: bool,
    /// Extra frequency ticks merged into the axis ticks
    pub freq_ticks: Vec<f64>,
    pub amplitude_limits: Option<(f64, f64)>,
    pub freq_limits: Option<(f64, f64)>,
    pub freq_db_limits: Option<(f64, f64)>,
    pub phase_limits: Option<(f64, f64)>,
    pub phase_arg: Option<PhaseArg>,
    pub phase_window: PhaseWindow,
    pub colormap: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let spectrogram = SpectrogramConfig::default();
        Self {
            title: "Title".to_string(),
            horizontal: true,
            normalized_freq: false,
            sample_rate: 48000,
            pad_width: 1024,
            fit_pad_width: true,
            log_freq: false,
            freq_response: true,
            phase_response: false,
            dots: false,
            divide_by_length: false,
            spectrogram: false,
            segment_size: spectrogram.segment_size,
            overlap: spectrogram.overlap_factor,
            vmin: spectrogram.vmin,
            vmax: spectrogram.vmax,
            normalize: spectrogram.normalize,
            freq_ticks: Vec::new(),
            amplitude_limits: None,
            freq_limits: None,
            freq_db_limits: None,
            phase_limits: None,
            phase_arg: None,
            phase_window: PhaseWindow::Standard,
            colormap: spectrogram.colormap,
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Sample rate must be positive".to_string(),
            ));
        }
        if self.pad_width == 0 {
            return Err(PlotError::InvalidConfiguration(
                "Pad width must be positive".to_string(),
            ));
        }

        for (name, limits) in [
            ("amplitude", self.amplitude_limits),
            ("frequency", self.freq_limits),
            ("gain", self.freq_db_limits),
            ("phase", self.phase_limits),
        ] {
            if let Some((lo, hi)) = limits {
                if !(lo < hi) {
                    return Err(PlotError::InvalidConfiguration(format!(
                        "Invalid {} limits: [{}, {}]",
                        name, lo, hi
                    )));
                }
            }
        }

        if self.spectrogram {
            self.spectrogram_config().validate()?;
        }
        Ok(())
    }

    pub fn frequency_axis(&self) -> FrequencyAxis {
        if self.normalized_freq {
            FrequencyAxis::Normalized
        } else {
            FrequencyAxis::Hertz
        }
    }

    /// Transform parameters for a block of `block_len` samples
    pub fn spectrum_config(&self, block_len: usize) -> SpectrumConfig {
        SpectrumConfig {
            pad_width: self.pad_width,
            divide_by_length: self.divide_by_length,
            phase_reference: self.phase_arg.map(|arg| arg.reference(block_len)),
            fit_pad_width: self.fit_pad_width,
        }
    }

    pub fn spectrogram_config(&self) -> SpectrogramConfig {
        SpectrogramConfig {
            segment_size: self.segment_size,
            overlap_factor: self.overlap,
            normalize: self.normalize,
            vmin: self.vmin,
            vmax: self.vmax,
            colormap: self.colormap.clone(),
            ..Default::default()
        }
    }

    /// Number of response panels: amplitude plus the enabled spectra
    pub fn panel_count(&self) -> usize {
        1 + self.freq_response as usize + self.phase_response as usize
    }
}

/// What a panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Amplitude,
    Magnitude,
    Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    Linear,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Dot,
}

/// Label, range and ticks of one axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub scale: AxisScale,
    pub ticks: Option<TickSet>,
}

impl Axis {
    fn linear(label: &str) -> Self {
        Self {
            label: label.to_string(),
            lower: None,
            upper: None,
            scale: AxisScale::Linear,
            ticks: None,
        }
    }

    fn with_limits(mut self, (lower, upper): (f64, f64)) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    pub fn limits(&self) -> Option<(f64, f64)> {
        Some((self.lower?, self.upper?))
    }
}

/// One line plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub marker: Option<Marker>,
}

/// Panel grid and figure size in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    pub rows: usize,
    pub columns: usize,
    pub figure_size: (f64, f64),
}

impl Layout {
    pub fn new(panels: usize, horizontal: bool) -> Self {
        let n = panels as f64;
        if horizontal {
            Self {
                rows: panels,
                columns: 1,
                figure_size: (10.0, 5.0 * n),
            }
        } else {
            Self {
                rows: 1,
                columns: panels,
                figure_size: (6.0 * n, 6.0),
            }
        }
    }
}

/// Amplitude, magnitude and phase panels for one sample block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePlan {
    pub title: String,
    pub layout: Layout,
    pub sample_rate: u32,
    pub panels: Vec<Panel>,
}

impl ResponsePlan {
    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.kind == kind)
    }
}

/// Spectrogram image with everything needed to draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrogramPlan {
    pub title: String,
    pub spectrogram: Spectrogram,
    pub colormap: Colormap,
    pub x_label: String,
    pub y_label: String,
}

/// Output of a plot request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlotPlan {
    Response(ResponsePlan),
    Spectrogram(SpectrogramPlan),
}

/// Build the plan for `input` according to `config`
///
/// Bare arrays use `config.sample_rate`; decoded sources bring their own.
/// The spectrogram colormap is looked up in `registry` and registered there
/// first if it is the built-in one and still missing.
pub fn plan(
    input: SignalInput,
    config: &PlotConfig,
    registry: &mut ColormapRegistry,
) -> Result<PlotPlan> {
    config.validate()?;

    if let SignalInput::SignalSource(signal) = &input {
        if signal.sample_rate() != config.sample_rate {
            log::warn!(
                "Using source sample rate {} Hz instead of configured {} Hz",
                signal.sample_rate(),
                config.sample_rate
            );
        }
    }

    let signal = input.into_signal(config.sample_rate);
    if signal.is_empty() {
        return Err(PlotError::InsufficientSamples(
            "Signal contains no samples".to_string(),
        ));
    }
    if signal.sample_rate() == 0 {
        return Err(PlotError::InvalidConfiguration(
            "Sample rate must be positive".to_string(),
        ));
    }

    let plan = if config.spectrogram {
        PlotPlan::Spectrogram(spectrogram_plan(&signal, config, registry)?)
    } else {
        PlotPlan::Response(response_plan(&signal, config)?)
    };

    log::info!("Plot plan built for '{}'", config.title);
    Ok(plan)
}

/// `plan` against the process-wide default colormap registry
pub fn plan_with_default_registry(input: SignalInput, config: &PlotConfig) -> Result<PlotPlan> {
    crate::colormap::with_default_registry(|registry| plan(input, config, registry))
}

fn spectrogram_plan(
    signal: &Signal,
    config: &PlotConfig,
    registry: &mut ColormapRegistry,
) -> Result<SpectrogramPlan> {
    if !registry.contains(&config.colormap) && config.colormap == SPECTROGRAM_COLORMAP {
        registry.register(Colormap::spectrogram());
    }
    let colormap = registry.resolve(&config.colormap)?.clone();

    let spectrogram = Spectrogram::compute(signal, &config.spectrogram_config())?;

    Ok(SpectrogramPlan {
        title: config.title.clone(),
        spectrogram,
        colormap,
        x_label: "Time (s)".to_string(),
        y_label: "Frequency (Hz)".to_string(),
    })
}

fn response_plan(signal: &Signal, config: &PlotConfig) -> Result<ResponsePlan> {
    let samples = signal.samples();
    let n = samples.len();

    let mut panels = Vec::with_capacity(config.panel_count());
    panels.push(amplitude_panel(samples, config));

    if config.freq_response || config.phase_response {
        let spectrum_config = config.spectrum_config(n);
        let spectrum = analyze(samples, &spectrum_config)?;
        let x_axis = frequency_axis(config, signal.sample_rate())?;
        let x = config
            .frequency_axis()
            .values(spectrum.len(), signal.sample_rate());

        log::debug!(
            "Response of {} samples over {} bins (pad width {})",
            n,
            spectrum.len(),
            spectrum.pad_width()
        );

        if config.freq_response {
            panels.push(magnitude_panel(&spectrum, x.clone(), x_axis.clone(), config));
        }
        if config.phase_response {
            let phase = spectrum.phase_degrees(spectrum_config.phase_reference);
            panels.push(phase_panel(phase, x, x_axis, config));
        }
    }

    Ok(ResponsePlan {
        title: config.title.clone(),
        layout: Layout::new(panels.len(), config.horizontal),
        sample_rate: signal.sample_rate(),
        panels,
    })
}

fn amplitude_panel(samples: &[f64], config: &PlotConfig) -> Panel {
    let n = samples.len();
    let x_axis = Axis::linear("Samples").with_limits((0.0, n.saturating_sub(1) as f64));

    let mut y_axis = Axis::linear("Amplitude");
    match config.amplitude_limits {
        Some(limits) => y_axis = y_axis.with_limits(limits),
        None => y_axis.lower = min_value(samples),
    }

    Panel {
        kind: PanelKind::Amplitude,
        x: (0..n).map(|i| i as f64).collect(),
        y: samples.to_vec(),
        x_axis,
        y_axis,
        marker: config.dots.then_some(Marker::Dot),
    }
}

fn frequency_axis(config: &PlotConfig, sample_rate: u32) -> Result<Axis> {
    let convention = config.frequency_axis();
    let limits = config
        .freq_limits
        .unwrap_or_else(|| convention.limits(sample_rate));
    let mut axis = Axis::linear(convention.label()).with_limits(limits);

    if config.log_freq && convention == FrequencyAxis::Hertz {
        axis.scale = AxisScale::Log;
        axis.ticks = Some(TickSet::up_to(sample_rate as f64 / 2.0)?.with_extra(&config.freq_ticks));
    } else if !config.freq_ticks.is_empty() {
        axis.ticks = Some(match convention {
            FrequencyAxis::Hertz => TickSet::default().with_extra(&config.freq_ticks),
            FrequencyAxis::Normalized => {
                TickSet::default().with_extra_labeled(&config.freq_ticks, |v| v.to_string())
            }
        });
    }

    Ok(axis)
}

fn magnitude_panel(spectrum: &Spectrum, x: Vec<f64>, x_axis: Axis, config: &PlotConfig) -> Panel {
    let mut y_axis = Axis::linear("Gain (dB)");
    if let Some(limits) = config.freq_db_limits {
        y_axis = y_axis.with_limits(limits);
    }

    Panel {
        kind: PanelKind::Magnitude,
        x,
        y: spectrum.magnitude_db(),
        x_axis,
        y_axis,
        marker: None,
    }
}

fn phase_panel(phase: Vec<f64>, x: Vec<f64>, x_axis: Axis, config: &PlotConfig) -> Panel {
    let limits = config
        .phase_limits
        .unwrap_or_else(|| config.phase_window.limits());

    Panel {
        kind: PanelKind::Phase,
        x,
        y: phase,
        x_axis,
        y_axis: Axis::linear("Phase (\u{b0})").with_limits(limits),
        marker: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::DB_FLOOR;
    use std::f64::consts::PI;

    fn impulse(len: usize, at: usize) -> Vec<f64> {
        let mut data = vec![0.0; len];
        data[at] = 1.0;
        data
    }

    fn response(input: Vec<f64>, config: &PlotConfig) -> ResponsePlan {
        let mut registry = ColormapRegistry::new();
        match plan(SignalInput::SignalArray(input), config, &mut registry).unwrap() {
            PlotPlan::Response(plan) => plan,
            PlotPlan::Spectrogram(_) => panic!("expected a response plan"),
        }
    }

    #[test]
    fn test_default_panels() {
        let plan = response(impulse(16, 0), &PlotConfig::default());
        assert_eq!(plan.panels.len(), 2);
        assert_eq!(plan.layout.rows, 2);
        assert_eq!(plan.layout.columns, 1);
        assert_eq!(plan.layout.figure_size, (10.0, 10.0));

        let amp = plan.panel(PanelKind::Amplitude).unwrap();
        assert_eq!(amp.x.len(), 16);
        assert_eq!(amp.x_axis.limits(), Some((0.0, 15.0)));
        assert_eq!(amp.y_axis.lower, Some(0.0));
        assert_eq!(amp.marker, None);

        let mag = plan.panel(PanelKind::Magnitude).unwrap();
        assert_eq!(mag.y.len(), 512);
        assert_eq!(mag.x.len(), 512);
        assert_eq!(mag.x_axis.label, "Frequency (Hz)");
        assert_eq!(mag.x_axis.limits(), Some((10.0, 24000.0)));
        // A unit impulse is flat at 0 dB
        assert!(mag.y.iter().all(|&v| v.abs() < 1e-9));
    }

    #[test]
    fn test_vertical_layout_with_phase_and_dots() {
        let config = PlotConfig {
            horizontal: false,
            phase_response: true,
            dots: true,
            normalized_freq: true,
            ..Default::default()
        };
        let plan = response(impulse(8, 2), &config);
        assert_eq!(plan.layout.rows, 1);
        assert_eq!(plan.layout.columns, 3);
        assert_eq!(plan.layout.figure_size, (18.0, 6.0));
        assert_eq!(plan.panels[0].marker, Some(Marker::Dot));

        let phase = plan.panel(PanelKind::Phase).unwrap();
        assert_eq!(phase.y_axis.limits(), Some((-180.0, 180.0)));
        assert_eq!(phase.x_axis.limits(), Some((0.0, 1.0)));
        assert_eq!(phase.x[1], 1.0 / 512.0);
    }

    #[test]
    fn test_amplitude_only() {
        let config = PlotConfig {
            freq_response: false,
            ..Default::default()
        };
        let plan = response(vec![0.5, -0.25, 1.0], &config);
        assert_eq!(plan.panels.len(), 1);
        assert_eq!(plan.panels[0].y_axis.lower, Some(-0.25));
    }

    #[test]
    fn test_log_frequency_ticks() {
        let config = PlotConfig {
            log_freq: true,
            freq_ticks: vec![440.0],
            ..Default::default()
        };
        let plan = response(impulse(64, 0), &config);
        let axis = &plan.panel(PanelKind::Magnitude).unwrap().x_axis;
        assert_eq!(axis.scale, AxisScale::Log);
        let ticks = axis.ticks.as_ref().unwrap();
        assert_eq!(ticks.positions().last(), Some(&24000.0));
        assert!(ticks.positions().contains(&440.0));
        assert_eq!(ticks.labels().last().map(String::as_str), Some("24kHz"));
    }

    #[test]
    fn test_log_ignored_on_normalized_axis() {
        let config = PlotConfig {
            log_freq: true,
            normalized_freq: true,
            ..Default::default()
        };
        let plan = response(impulse(64, 0), &config);
        let axis = &plan.panel(PanelKind::Magnitude).unwrap().x_axis;
        assert_eq!(axis.scale, AxisScale::Linear);
        assert!(axis.ticks.is_none());
    }

    #[test]
    fn test_normalized_extra_ticks_unitless() {
        let config = PlotConfig {
            normalized_freq: true,
            freq_ticks: vec![0.5],
            ..Default::default()
        };
        let plan = response(impulse(64, 0), &config);
        let ticks = plan
            .panel(PanelKind::Magnitude)
            .unwrap()
            .x_axis
            .ticks
            .clone()
            .unwrap();
        assert_eq!(ticks.positions(), vec![0.5]);
        assert_eq!(ticks.labels(), vec!["0.5"]);

        let hertz = PlotConfig {
            freq_ticks: vec![1000.0],
            ..Default::default()
        };
        let plan = response(impulse(64, 0), &hertz);
        let ticks = plan
            .panel(PanelKind::Magnitude)
            .unwrap()
            .x_axis
            .ticks
            .clone()
            .unwrap();
        assert_eq!(ticks.labels(), vec!["1kHz"]);
    }

    #[test]
    fn test_limit_overrides() {
        let config = PlotConfig {
            phase_response: true,
            freq_limits: Some((20.0, 20000.0)),
            freq_db_limits: Some((-160.0, 10.0)),
            phase_window: PhaseWindow::Wide,
            amplitude_limits: Some((-1.0, 1.0)),
            ..Default::default()
        };
        let plan = response(impulse(32, 0), &config);
        let mag = plan.panel(PanelKind::Magnitude).unwrap();
        assert_eq!(mag.x_axis.limits(), Some((20.0, 20000.0)));
        assert_eq!(mag.y_axis.limits(), Some((-160.0, 10.0)));
        let phase = plan.panel(PanelKind::Phase).unwrap();
        assert_eq!(phase.y_axis.limits(), Some((-190.0, 190.0)));
        assert_eq!(plan.panels[0].y_axis.limits(), Some((-1.0, 1.0)));
    }

    #[test]
    fn test_phase_auto_matches_explicit_center() {
        let block: Vec<f64> = (0..31).map(|i| ((i * 13) % 7) as f64 - 3.0).collect();
        let auto = PlotConfig {
            phase_response: true,
            phase_arg: Some(PhaseArg::Auto),
            ..Default::default()
        };
        let explicit = PlotConfig {
            phase_arg: Some(PhaseArg::Sample(15.0)),
            ..auto.clone()
        };
        let a = response(block.clone(), &auto);
        let b = response(block, &explicit);
        assert_eq!(
            a.panel(PanelKind::Phase).unwrap().y,
            b.panel(PanelKind::Phase).unwrap().y
        );
    }

    #[test]
    fn test_phase_auto_flattens_symmetric_filter() {
        // Symmetric FIR: linear phase around its center
        let taps = vec![0.1, 0.2, 0.4, 0.2, 0.1];
        let config = PlotConfig {
            freq_response: false,
            phase_response: true,
            pad_width: 64,
            phase_arg: Some(PhaseArg::Auto),
            ..Default::default()
        };
        let plan = response(taps, &config);
        let phase = plan.panel(PanelKind::Phase).unwrap();
        let magnitude = analyze(
            &[0.1, 0.2, 0.4, 0.2, 0.1],
            &SpectrumConfig {
                pad_width: 64,
                ..Default::default()
            },
        )
        .unwrap()
        .magnitude_db();
        for (p, m) in phase.y.iter().zip(&magnitude) {
            if *m > -100.0 {
                assert!(p.abs() < 1e-6 || (p - 180.0).abs() < 1e-6, "phase {}", p);
            }
        }
    }

    #[test]
    fn test_divide_by_length_and_padding() {
        let config = PlotConfig {
            divide_by_length: true,
            pad_width: 256,
            ..Default::default()
        };
        let plan = response(vec![1.0; 100], &config);
        let mag = plan.panel(PanelKind::Magnitude).unwrap();
        assert_eq!(mag.y.len(), 128);
        assert!(mag.y[0].abs() < 1e-9);
        assert!(mag.y.iter().all(|&v| v >= DB_FLOOR));
    }

    #[test]
    fn test_pad_width_grows_to_block() {
        let grown = response(vec![0.5; 3000], &PlotConfig::default());
        assert_eq!(grown.panel(PanelKind::Magnitude).unwrap().y.len(), 1500);

        let strict = PlotConfig {
            fit_pad_width: false,
            ..Default::default()
        };
        let mut registry = ColormapRegistry::new();
        assert!(matches!(
            plan(SignalInput::SignalArray(vec![0.5; 3000]), &strict, &mut registry),
            Err(PlotError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_sine_peak_through_orchestrator() {
        let samples: Vec<f64> = (0..4800)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / 48000.0).sin())
            .collect();
        let config = PlotConfig {
            pad_width: 4800,
            ..Default::default()
        };
        let plan = response(samples, &config);
        let mag = plan.panel(PanelKind::Magnitude).unwrap();
        let (peak, _) = mag
            .y
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert!((mag.x[peak] - 1000.0).abs() <= 10.0);
    }

    #[test]
    fn test_spectrogram_mode() {
        let signal = Signal::new((0..48000).map(|i| (i as f64 * 0.3).sin()).collect(), 44100);
        let config = PlotConfig {
            spectrogram: true,
            segment_size: 256,
            overlap: 4,
            ..Default::default()
        };
        let mut registry = ColormapRegistry::new();
        let result = plan(SignalInput::SignalSource(signal), &config, &mut registry).unwrap();
        match result {
            PlotPlan::Spectrogram(plan) => {
                assert_eq!(plan.spectrogram.shape(), (512, 48000 / 256 - 1 - 4));
                assert_eq!(plan.spectrogram.extent.frequency, (0.0, 22050.0));
                assert_eq!(plan.colormap.name(), SPECTROGRAM_COLORMAP);
                assert_eq!(plan.spectrogram.vmin, -160.0);
            }
            PlotPlan::Response(_) => panic!("expected a spectrogram plan"),
        }
        assert!(registry.contains(SPECTROGRAM_COLORMAP));
    }

    #[test]
    fn test_default_registry_plan() {
        let config = PlotConfig {
            spectrogram: true,
            segment_size: 64,
            overlap: 2,
            ..Default::default()
        };
        let samples: Vec<f64> = (0..4096).map(|i| (i as f64 * 0.1).sin()).collect();
        let result =
            plan_with_default_registry(SignalInput::SignalArray(samples), &config).unwrap();
        assert!(matches!(result, PlotPlan::Spectrogram(_)));
        assert!(crate::colormap::with_default_registry(|r| r.contains(SPECTROGRAM_COLORMAP)));
    }

    #[test]
    fn test_unknown_colormap() {
        let config = PlotConfig {
            spectrogram: true,
            colormap: "nope".to_string(),
            ..Default::default()
        };
        let mut registry = ColormapRegistry::new();
        assert!(matches!(
            plan(SignalInput::SignalArray(vec![0.0; 10000]), &config, &mut registry),
            Err(PlotError::InvalidColormap(_))
        ));
    }

    #[test]
    fn test_empty_and_invalid_inputs() {
        let mut registry = ColormapRegistry::new();
        assert!(matches!(
            plan(SignalInput::SignalArray(Vec::new()), &PlotConfig::default(), &mut registry),
            Err(PlotError::InsufficientSamples(_))
        ));

        let bad = PlotConfig {
            freq_limits: Some((100.0, 10.0)),
            ..Default::default()
        };
        assert!(matches!(
            plan(SignalInput::SignalArray(vec![1.0]), &bad, &mut registry),
            Err(PlotError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_spectrogram_fields_ignored_in_response_mode() {
        let config = PlotConfig {
            vmin: 0.0,
            vmax: -10.0,
            segment_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let plan = response(impulse(64, 0), &config);
        assert_eq!(plan.panels.len(), 2);

        let spectrogram = PlotConfig {
            spectrogram: true,
            ..config
        };
        assert!(matches!(
            spectrogram.validate(),
            Err(PlotError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_phase_arg_parsing() {
        assert_eq!("auto".parse::<PhaseArg>().unwrap(), PhaseArg::Auto);
        assert_eq!("12.5".parse::<PhaseArg>().unwrap(), PhaseArg::Sample(12.5));
        assert!("later".parse::<PhaseArg>().is_err());
        assert_eq!(PhaseArg::Auto.reference(9), 4.0);
        assert_eq!(PhaseArg::Auto.reference(10), 4.5);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: PlotConfig = serde_json::from_str(
            r#"{"title": "Biquad", "phase_response": true, "phase_arg": "auto",
                "log_freq": true, "freq_db_limits": [-160, 10], "pad_width": 8192}"#,
        )
        .unwrap();
        assert_eq!(config.title, "Biquad");
        assert_eq!(config.phase_arg, Some(PhaseArg::Auto));
        assert_eq!(config.freq_db_limits, Some((-160.0, 10.0)));
        assert_eq!(config.pad_width, 8192);
        assert_eq!(config.sample_rate, 48000);

        let explicit: PlotConfig = serde_json::from_str(r#"{"phase_arg": 3}"#).unwrap();
        assert_eq!(explicit.phase_arg, Some(PhaseArg::Sample(3.0)));

        assert!(serde_json::from_str::<PlotConfig>(r#"{"phase_arg": "soon"}"#).is_err());
    }

    #[test]
    fn test_plan_serializes() {
        let plan = response(impulse(8, 0), &PlotConfig::default());
        let json = serde_json::to_value(PlotPlan::Response(plan)).unwrap();
        assert_eq!(json["mode"], "response");
        assert_eq!(json["panels"][1]["kind"], "magnitude");
    }
}
