//! Sample accumulation with threshold-triggered analysis and bounded retention.
//!
//! The buffer grows one frame at a time. Analysis fires only when the length
//! lands exactly on one of the configured window sizes, so the FFT runs at a
//! few fixed granularities instead of on every frame.
//!
//! Once the length reaches the largest window size the buffer is cut back to
//! the most recent `largest / 4 - 1` samples (63 for a ceiling of 256). The
//! cut happens after the ceiling window has been snapshotted, so that window
//! is still analyzed. The next cycle then triggers at 64, 128 and 256.

use tracing::debug;

use super::ProcessingError;
use crate::types::Sample;

/// Owned snapshot of the most recent samples, handed to the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    samples: Vec<Sample>,
}

impl SampleWindow {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.position)
    }

    /// Frames per second implied by the first and last timestamps.
    ///
    /// `(N - 1) / (t_last - t_first)`
    pub fn sample_rate(&self) -> Result<f64, ProcessingError> {
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => (first, last),
            _ => return Err(ProcessingError::InvalidSampleRate(0.0)),
        };

        let span = last.timestamp - first.timestamp;
        let rate = (self.samples.len() - 1) as f64 / span;
        if !span.is_finite() || span <= 0.0 || !rate.is_finite() {
            return Err(ProcessingError::InvalidSampleRate(rate));
        }
        Ok(rate)
    }
}

/// Timestamp-ordered position history.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
    window_sizes: Vec<usize>,
}

impl SampleBuffer {
    /// Create a buffer that triggers at the given window sizes.
    ///
    /// Sizes are sorted and deduplicated. Each must be a power of two >= 2.
    pub fn new(mut window_sizes: Vec<usize>) -> Result<Self, ProcessingError> {
        window_sizes.sort_unstable();
        window_sizes.dedup();

        if window_sizes.is_empty() {
            return Err(ProcessingError::InvalidWindowLength { len: 0 });
        }
        if let Some(&bad) = window_sizes
            .iter()
            .find(|&&n| n < 2 || !n.is_power_of_two())
        {
            return Err(ProcessingError::InvalidWindowLength { len: bad });
        }

        let ceiling = window_sizes[window_sizes.len() - 1];
        Ok(Self {
            samples: Vec::with_capacity(ceiling),
            window_sizes,
        })
    }

    /// Append a sample to the tail.
    ///
    /// Rejects non-finite values and timestamps earlier than the current tail;
    /// the buffer is left unchanged in both cases.
    pub fn append(&mut self, sample: Sample) -> Result<(), ProcessingError> {
        if !sample.is_finite() {
            return Err(ProcessingError::NonFiniteSample);
        }
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                return Err(ProcessingError::OutOfOrderSamples {
                    previous: last.timestamp,
                    timestamp: sample.timestamp,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Window size matched exactly by the current length, if any.
    pub fn triggered_window(&self) -> Option<usize> {
        let len = self.samples.len();
        self.window_sizes.iter().copied().find(|&n| n == len)
    }

    /// Snapshot of the most recent `n` samples.
    pub fn window(&self, n: usize) -> Option<SampleWindow> {
        if n == 0 || n > self.samples.len() {
            return None;
        }
        let start = self.samples.len() - n;
        Some(SampleWindow::new(self.samples[start..].to_vec()))
    }

    /// Cut back to the retention length if the ceiling has been reached.
    ///
    /// Returns true when samples were dropped.
    pub fn trim(&mut self) -> bool {
        if self.samples.len() < self.ceiling() {
            return false;
        }
        let keep = self.retain_len();
        let drop = self.samples.len() - keep;
        self.samples.drain(..drop);
        debug!(dropped = drop, retained = keep, "Sample buffer trimmed");
        true
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window_sizes(&self) -> &[usize] {
        &self.window_sizes
    }

    /// Largest configured window size.
    pub fn ceiling(&self) -> usize {
        self.window_sizes[self.window_sizes.len() - 1]
    }

    /// Samples kept after a trim: `ceiling / 4 - 1`.
    pub fn retain_len(&self) -> usize {
        (self.ceiling() / 4).saturating_sub(1)
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}
