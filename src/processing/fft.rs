//! FFT computation using rustfft
//!
//! Produces the one-sided magnitude spectrum of a position window.
//!
//! # Scaling
//!
//! Each of the `N/2` output bins holds `|X[k]| / N`, where `X` is the complex
//! DFT of the real input. No window function is applied, so a tone that falls
//! between bins leaks into its neighbours; the peak still lands on the nearest
//! bin.
//!
//! # Example
//!
//! ```ignore
//! let mut analyzer = SpectrumAnalyzer::new();
//! let window = buffer.window(64).unwrap();
//! let spectrum = analyzer.analyze(&window)?;
//! println!("resolution: {:.3} Hz", spectrum.resolution());
//! ```

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::HashMap;
use std::sync::Arc;

use super::{ProcessingError, SampleWindow, Spectrum};

/// FFT front end with plans cached per window length.
///
/// Window lengths cycle through a handful of sizes, so each plan is built once
/// and reused for the life of the pipeline.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f64>,
    plans: HashMap<usize, Arc<dyn Fft<f64>>>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    /// Analyze a sample window, deriving the sample rate from its timestamps.
    pub fn analyze(&mut self, window: &SampleWindow) -> Result<Spectrum, ProcessingError> {
        check_length(window.len())?;
        let sample_rate = window.sample_rate()?;
        let positions: Vec<f64> = window.positions().collect();
        self.compute(&positions, sample_rate)
    }

    /// Magnitude spectrum of evenly spaced `signal` sampled at `sample_rate` Hz.
    pub fn compute(
        &mut self,
        signal: &[f64],
        sample_rate: f64,
    ) -> Result<Spectrum, ProcessingError> {
        let n = signal.len();
        check_length(n)?;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ProcessingError::InvalidSampleRate(sample_rate));
        }

        let fft = self.plan(n);

        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft.process(&mut buffer);

        let half = n / 2;
        let bin_width = sample_rate / n as f64;
        let scale = 1.0 / n as f64;

        let frequencies: Vec<f64> = (0..half).map(|k| k as f64 * bin_width).collect();
        let magnitudes: Vec<f64> = buffer.iter().take(half).map(|c| c.norm() * scale).collect();

        Ok(Spectrum {
            frequencies,
            magnitudes,
            sample_rate,
            fft_size: n,
        })
    }

    /// Number of distinct FFT sizes planned so far.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    fn plan(&mut self, n: usize) -> Arc<dyn Fft<f64>> {
        let planner = &mut self.planner;
        Arc::clone(
            self.plans
                .entry(n)
                .or_insert_with(|| planner.plan_fft_forward(n)),
        )
    }
}

fn check_length(n: usize) -> Result<(), ProcessingError> {
    if n < 2 || !n.is_power_of_two() {
        return Err(ProcessingError::InvalidWindowLength { len: n });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
