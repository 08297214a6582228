//! Dominant-frequency selection over a filtered spectrum.

use serde::{Deserialize, Serialize};

use super::FilteredSpectrum;

/// Strongest in-band bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakResult {
    pub index: usize,
    /// Frequency of the bin (Hz)
    pub frequency: f64,
    /// Normalized magnitude, usable as a quality hint
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeakDetector;

impl PeakDetector {
    pub fn new() -> Self {
        Self
    }

    /// Linear scan of the retained bins; ties resolve to the lowest index.
    ///
    /// `None` when no retained bin exists in the spectrum.
    pub fn peak(&self, filtered: &FilteredSpectrum) -> Option<PeakResult> {
        let mut best: Option<(usize, f64)> = None;
        for k in filtered.min_idx()..=filtered.max_idx() {
            let Some(&m) = filtered.magnitudes().get(k) else {
                break;
            };
            if best.map_or(true, |(_, b)| m > b) {
                best = Some((k, m));
            }
        }

        let (index, magnitude) = best?;
        Some(PeakResult {
            index,
            frequency: *filtered.frequencies().get(index)?,
            magnitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{BandpassFilter, Spectrum, SpectrumAnalyzer};
    use std::f64::consts::PI;

    fn spectrum_from(magnitudes: Vec<f64>) -> Spectrum {
        let n = magnitudes.len() * 2;
        Spectrum {
            frequencies: (0..magnitudes.len()).map(|k| k as f64).collect(),
            magnitudes,
            sample_rate: n as f64,
            fft_size: n,
        }
    }

    #[test]
    fn test_picks_maximum() {
        let spectrum = spectrum_from(vec![9.0, 0.1, 0.4, 0.8, 0.3, 0.2, 0.1, 0.0]);
        let filtered = BandpassFilter::new(1.0, 6.0).filter(&spectrum).unwrap();
        let peak = PeakDetector::new().peak(&filtered).unwrap();
        assert_eq!(peak.index, 3);
        assert_eq!(peak.frequency, 3.0);
        assert_eq!(peak.magnitude, 0.8);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let spectrum = spectrum_from(vec![0.0, 0.2, 0.5, 0.1, 0.5, 0.5, 0.0, 0.0]);
        let filtered = BandpassFilter::new(0.5, 7.0).filter(&spectrum).unwrap();
        assert_eq!(PeakDetector::new().peak(&filtered).unwrap().index, 2);
    }

    #[test]
    fn test_out_of_band_energy_ignored() {
        // Large DC and a strong 7 Hz line outside a 1-5 Hz band
        let spectrum = spectrum_from(vec![5.0, 0.1, 0.2, 0.3, 0.1, 0.0, 0.0, 4.0]);
        let filtered = BandpassFilter::new(1.0, 5.0).filter(&spectrum).unwrap();
        let peak = PeakDetector::new().peak(&filtered).unwrap();
        assert_eq!(peak.frequency, 3.0);
    }

    #[test]
    fn test_sine_peak_within_one_bin_for_all_window_sizes() {
        let mut analyzer = SpectrumAnalyzer::new();
        let band = BandpassFilter::new(0.5, 50.0);
        let fps = 60.0;

        for n in [32usize, 64, 128, 256] {
            for f0 in [1.7, 2.9, 4.4, 11.3] {
                let signal: Vec<f64> = (0..n)
                    .map(|i| 0.4 + 0.02 * (2.0 * PI * f0 * i as f64 / fps).sin())
                    .collect();
                let spectrum = analyzer.compute(&signal, fps).unwrap();
                let peak = PeakDetector::new()
                    .peak(&band.filter(&spectrum).unwrap())
                    .unwrap();
                let bin = fps / n as f64;
                assert!(
                    (peak.frequency - f0).abs() <= bin,
                    "N={} f0={} got {} (bin {})",
                    n,
                    f0,
                    peak.frequency,
                    bin
                );
            }
        }
    }
}
