//! Time-domain input signals
//!
//! A plot request receives its samples either as a bare array (the sample
//! rate then comes from the plot configuration) or as a signal that was
//! already decoded together with its own sample rate.

/// Immutable block of real samples with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }
}

/// Input handed to the response orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SignalInput {
    /// Raw samples; the sample rate is taken from the plot configuration
    SignalArray(Vec<f64>),
    /// Pre-decoded samples carrying their own sample rate
    SignalSource(Signal),
}

impl SignalInput {
    /// Resolve into a `Signal`, using `default_rate` for bare arrays
    pub fn into_signal(self, default_rate: u32) -> Signal {
        match self {
            SignalInput::SignalArray(samples) => Signal::new(samples, default_rate),
            SignalInput::SignalSource(signal) => signal,
        }
    }

    pub fn samples(&self) -> &[f64] {
        match self {
            SignalInput::SignalArray(samples) => samples,
            SignalInput::SignalSource(signal) => signal.samples(),
        }
    }
}

impl From<Signal> for SignalInput {
    fn from(signal: Signal) -> Self {
        SignalInput::SignalSource(signal)
    }
}

impl From<Vec<f64>> for SignalInput {
    fn from(samples: Vec<f64>) -> Self {
        SignalInput::SignalArray(samples)
    }
}
