//! Synthetic tracker output for demos and regression runs
//!
//! Generates a damped sinusoid at the period the spring model predicts for a
//! given load, sampled like a camera would: fixed nominal frame rate, small
//! timing jitter and Gaussian position noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use super::AcquisitionError;
use crate::config::defaults::{
    SIMULATION_AMPLITUDE, SIMULATION_DAMPING_PER_SEC, SIMULATION_FPS, SIMULATION_REST_POSITION,
    SIMULATION_SAMPLES,
};
use crate::physics_engine::period_for_mass;
use crate::types::{CalibrationParams, Observation};

/// Largest jitter as a fraction of the frame interval. Keeps timestamps ordered.
const MAX_JITTER_FRACTION: f64 = 0.45;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticOscillation {
    /// Load on the pan (kg)
    pub mass_kg: f64,
    /// Nominal frame rate (fps)
    pub fps: f64,
    /// Frames to generate
    pub samples: usize,
    /// Initial amplitude (normalized image units)
    pub amplitude: f64,
    pub rest_position: f64,
    /// Exponential decay rate (1/s)
    pub damping_per_sec: f64,
    /// Standard deviation of position noise
    pub noise_sigma: f64,
    /// Timestamp jitter as a fraction of the frame interval
    pub jitter_fraction: f64,
    pub seed: u64,
}

impl SyntheticOscillation {
    pub fn new(mass_kg: f64) -> Self {
        Self {
            mass_kg,
            fps: SIMULATION_FPS,
            samples: SIMULATION_SAMPLES,
            amplitude: SIMULATION_AMPLITUDE,
            rest_position: SIMULATION_REST_POSITION,
            damping_per_sec: SIMULATION_DAMPING_PER_SEC,
            noise_sigma: 0.0,
            jitter_fraction: 0.0,
            seed: 0x5ca1e,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_noise(mut self, sigma: f64) -> Self {
        self.noise_sigma = sigma;
        self
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Oscillation frequency the spring model predicts for this load (Hz).
    pub fn frequency_hz(&self, calib: &CalibrationParams) -> f64 {
        1.0 / period_for_mass(self.mass_kg, calib)
    }

    /// Generate the frames. The same seed always yields the same frames.
    pub fn generate(&self, calib: &CalibrationParams) -> Result<Vec<Observation>, AcquisitionError> {
        self.check()?;

        let frequency = self.frequency_hz(calib);
        if !frequency.is_finite() {
            return Err(AcquisitionError::InvalidSimulation(format!(
                "mass {} kg gives no finite oscillation frequency",
                self.mass_kg
            )));
        }

        let noise = Normal::new(0.0, self.noise_sigma)
            .map_err(|e| AcquisitionError::InvalidSimulation(format!("noise: {}", e)))?;
        let jitter = self.jitter_fraction.min(MAX_JITTER_FRACTION);
        let frame = 1.0 / self.fps;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let observations: Vec<Observation> = (0..self.samples)
            .map(|i| {
                let nominal = i as f64 * frame;
                let offset = if jitter > 0.0 {
                    rng.gen_range(-jitter..jitter) * frame
                } else {
                    0.0
                };
                // First frame is pinned so the series starts at t = 0.
                let t = if i == 0 { 0.0 } else { nominal + offset };
                let envelope = self.amplitude * (-self.damping_per_sec * t).exp();
                let position = self.rest_position
                    + envelope * (2.0 * PI * frequency * t).cos()
                    + noise.sample(&mut rng);
                Observation {
                    position,
                    timestamp: t,
                    confidence: 1.0,
                }
            })
            .collect();

        tracing::debug!(
            count = observations.len(),
            mass_kg = self.mass_kg,
            frequency_hz = frequency,
            fps = self.fps,
            "Generated synthetic oscillation"
        );
        Ok(observations)
    }

    fn check(&self) -> Result<(), AcquisitionError> {
        if !self.mass_kg.is_finite() || self.mass_kg < 0.0 {
            return Err(AcquisitionError::InvalidSimulation(format!(
                "mass must be a non-negative number, got {}",
                self.mass_kg
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(AcquisitionError::InvalidSimulation(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if !self.noise_sigma.is_finite() || self.noise_sigma < 0.0 {
            return Err(AcquisitionError::InvalidSimulation(format!(
                "noise sigma must be non-negative, got {}",
                self.noise_sigma
            )));
        }
        if !self.jitter_fraction.is_finite() || self.jitter_fraction < 0.0 {
            return Err(AcquisitionError::InvalidSimulation(format!(
                "jitter must be non-negative, got {}",
                self.jitter_fraction
            )));
        }
        Ok(())
    }
}
