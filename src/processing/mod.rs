//! Signal processing module - sample accumulation and spectral peak search
//!
//! ```text
//! SampleBuffer ──(threshold)──► SampleWindow ──► SpectrumAnalyzer ──► Spectrum
//!                                                                      │
//!                 PeakResult ◄── PeakDetector ◄── BandpassFilter ◄─────┘
//! ```

mod bandpass;
mod buffer;
mod fft;
mod peak;

pub use bandpass::{BandMask, BandpassFilter, FilteredSpectrum};
pub use buffer::{SampleBuffer, SampleWindow};
pub use fft::SpectrumAnalyzer;
pub use peak::{PeakDetector, PeakResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable failures of a single append or analysis step.
///
/// None of these abort the pipeline. The caller withholds the reading for that
/// cycle and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Invalid window length {len}: must be a power of two >= 2")]
    InvalidWindowLength { len: usize },

    #[error(
        "No spectrum bin within {lower_hz}-{higher_hz} Hz at {resolution_hz:.4} Hz resolution"
    )]
    EmptyBand {
        lower_hz: f64,
        higher_hz: f64,
        resolution_hz: f64,
    },

    #[error("Degenerate peak frequency: {0} Hz")]
    DegenerateFrequency(f64),

    #[error("Out-of-order sample: timestamp {timestamp} precedes {previous}")]
    OutOfOrderSamples { previous: f64, timestamp: f64 },

    #[error("Non-finite sample rejected")]
    NonFiniteSample,

    #[error("Invalid sampling rate: {0}")]
    InvalidSampleRate(f64),

    #[error("No measurement available to zero against")]
    NoMeasurement,

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
}

/// One-sided magnitude spectrum of a sample window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// Frequency of each bin (Hz), `k * sample_rate / fft_size`
    pub frequencies: Vec<f64>,
    /// `|X[k]| / N` for each bin
    pub magnitudes: Vec<f64>,
    /// Sample rate derived from the window timestamps (Hz)
    pub sample_rate: f64,
    /// FFT length N
    pub fft_size: usize,
}

impl Spectrum {
    /// Width of one bin (Hz).
    pub fn resolution(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}
