//! Frequency-domain bandpass: keep only plausible oscillation frequencies.

use serde::{Deserialize, Serialize};

use super::{ProcessingError, Spectrum};

/// Per-bin pass mask. The DC bin is never passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandMask {
    pass: Vec<bool>,
}

impl BandMask {
    pub fn passes(&self, bin: usize) -> bool {
        self.pass.get(bin).copied().unwrap_or(false)
    }

    pub fn pass_count(&self) -> usize {
        self.pass.iter().filter(|&&p| p).count()
    }

    pub fn len(&self) -> usize {
        self.pass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pass.is_empty()
    }
}

/// Spectrum with out-of-band bins zeroed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredSpectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
    mask: BandMask,
    min_idx: usize,
    max_idx: usize,
}

impl FilteredSpectrum {
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn mask(&self) -> &BandMask {
        &self.mask
    }

    /// Lowest retained bin
    pub fn min_idx(&self) -> usize {
        self.min_idx
    }

    /// Highest retained bin
    pub fn max_idx(&self) -> usize {
        self.max_idx
    }

    /// Number of bins between the band edges, inclusive.
    pub fn band_width_bins(&self) -> usize {
        self.max_idx - self.min_idx + 1
    }
}

/// Zeroes every bin outside `[lower_hz, higher_hz]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandpassFilter {
    lower_hz: f64,
    higher_hz: f64,
}

impl BandpassFilter {
    pub fn new(lower_hz: f64, higher_hz: f64) -> Self {
        Self {
            lower_hz,
            higher_hz,
        }
    }

    pub fn lower_hz(&self) -> f64 {
        self.lower_hz
    }

    pub fn higher_hz(&self) -> f64 {
        self.higher_hz
    }

    /// Build the pass mask for a frequency axis.
    pub fn mask(&self, frequencies: &[f64]) -> BandMask {
        let pass = frequencies
            .iter()
            .enumerate()
            .map(|(k, &f)| k > 0 && f >= self.lower_hz && f <= self.higher_hz)
            .collect();
        BandMask { pass }
    }

    /// Apply the band to a spectrum.
    ///
    /// Fails with [`ProcessingError::EmptyBand`] when the window length and
    /// sample rate leave no bin inside the band.
    pub fn filter(&self, spectrum: &Spectrum) -> Result<FilteredSpectrum, ProcessingError> {
        let mask = self.mask(&spectrum.frequencies);

        let mut min_idx: Option<usize> = None;
        let mut max_idx: Option<usize> = None;
        for k in (0..mask.len()).filter(|&k| mask.passes(k)) {
            min_idx.get_or_insert(k);
            max_idx = Some(k);
        }

        let (min_idx, max_idx) = match (min_idx, max_idx) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => {
                return Err(ProcessingError::EmptyBand {
                    lower_hz: self.lower_hz,
                    higher_hz: self.higher_hz,
                    resolution_hz: spectrum.resolution(),
                })
            }
        };

        let magnitudes = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .map(|(k, &m)| if mask.passes(k) { m } else { 0.0 })
            .collect();

        Ok(FilteredSpectrum {
            frequencies: spectrum.frequencies.clone(),
            magnitudes,
            mask,
            min_idx,
            max_idx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_spectrum(n: usize, sample_rate: f64) -> Spectrum {
        let bin = sample_rate / n as f64;
        Spectrum {
            frequencies: (0..n / 2).map(|k| k as f64 * bin).collect(),
            magnitudes: vec![1.0; n / 2],
            sample_rate,
            fft_size: n,
        }
    }

    #[test]
    fn test_zeroes_out_of_band_bins() {
        // 1 Hz resolution, bins 0..32 Hz
        let spectrum = flat_spectrum(64, 64.0);
        let filtered = BandpassFilter::new(2.5, 10.0).filter(&spectrum).unwrap();

        assert_eq!(filtered.min_idx, 3);
        assert_eq!(filtered.max_idx, 10);
        assert_eq!(filtered.mask().pass_count(), 8);
        for (k, m) in filtered.magnitudes.iter().enumerate() {
            let expected = if (3..=10).contains(&k) { 1.0 } else { 0.0 };
            assert_eq!(*m, expected, "bin {}", k);
        }
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let spectrum = flat_spectrum(64, 64.0);
        let filtered = BandpassFilter::new(4.0, 6.0).filter(&spectrum).unwrap();
        assert_eq!((filtered.min_idx, filtered.max_idx), (4, 6));
    }

    #[test]
    fn test_dc_never_passes() {
        let spectrum = flat_spectrum(32, 32.0);
        let filtered = BandpassFilter::new(0.0, 3.0).filter(&spectrum).unwrap();
        assert_eq!(filtered.min_idx, 1);
        assert_eq!(filtered.magnitudes[0], 0.0);
    }

    #[test]
    fn test_empty_band_when_resolution_too_coarse() {
        // 62.5 Hz resolution: first non-DC bin already above 50 Hz
        let spectrum = flat_spectrum(32, 2000.0);
        let err = BandpassFilter::new(0.5, 50.0).filter(&spectrum).unwrap_err();
        assert!(matches!(err, ProcessingError::EmptyBand { .. }));
    }

    #[test]
    fn test_empty_band_when_rate_too_low() {
        // 0.5 fps: highest bin is below 0.25 Hz
        let spectrum = flat_spectrum(32, 0.5);
        let err = BandpassFilter::new(0.5, 50.0).filter(&spectrum).unwrap_err();
        match err {
            ProcessingError::EmptyBand {
                lower_hz,
                higher_hz,
                resolution_hz,
            } => {
                assert_eq!(lower_hz, 0.5);
                assert_eq!(higher_hz, 50.0);
                assert!((resolution_hz - 0.5 / 32.0).abs() < 1e-12);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_peak_ignores_band_edges_past_the_spectrum() {
        use crate::processing::PeakDetector;

        let filtered = FilteredSpectrum {
            frequencies: vec![0.0, 1.0, 2.0, 3.0],
            magnitudes: vec![0.0, 0.2, 0.7, 0.1],
            mask: BandMask {
                pass: vec![false, true, true, true],
            },
            min_idx: 1,
            max_idx: 40,
        };
        let peak = PeakDetector::new().peak(&filtered).unwrap();
        assert_eq!(peak.index, 2);

        let beyond = FilteredSpectrum {
            min_idx: 10,
            ..filtered
        };
        assert!(PeakDetector::new().peak(&beyond).is_none());
    }
}
