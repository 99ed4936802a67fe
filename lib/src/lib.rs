//! dspplot Library
//!
//! Turns time-domain samples into frequency-domain plot data: magnitude and
//! phase responses, spectrograms, logarithmic frequency ticks and colormaps.
//! Drawing is left to an external renderer; this crate only produces the
//! bounded, labeled arrays it needs.

pub mod audio_io;
pub mod colormap;
pub mod error;
pub mod perf;
pub mod response;
pub mod signal;
pub mod spectrogram;
pub mod spectrum;
pub mod ticks;
pub mod utils;
pub mod window;

pub use colormap::{Colormap, ColormapRegistry, Rgb};
pub use error::PlotError;
pub use num_complex::Complex64;
pub use response::{plan, PhaseArg, PlotConfig, PlotPlan};
pub use signal::{Signal, SignalInput};
pub use spectrogram::{Spectrogram, SpectrogramConfig};
pub use ticks::{Tick, TickSet};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
///
/// Sets up logging when the `env_logger` feature is enabled.
pub fn init() {
    #[cfg(all(not(target_arch = "wasm32"), feature = "env_logger"))]
    {
        // A second call finds the logger already installed
        let _ = env_logger::try_init();
    }
}

/// Result type for plotting operations
pub type Result<T> = std::result::Result<T, PlotError>;
