//! Pipeline Coordinator - sample-to-weight processing sequence
//!
//! ```text
//! STEP 1: Append sample to the buffer (ordering / finiteness checks)
//! STEP 2: Threshold check (length exactly 32, 64, 128 or 256)
//! STEP 3: Snapshot the window, then trim the buffer at the ceiling
//! STEP 4: Spectrum → bandpass → peak
//! STEP 5: Period → raw weight → unit-scaled, tare-adjusted reading
//! ```
//!
//! Steps 3-5 run only when step 2 fires. A failure in any step withholds the
//! reading for that cycle; the previous display value stays up.

use chrono::Utc;
use tracing::{debug, info};

use super::{ControlCommand, PipelineCommand, PipelineState, PipelineStats, TareState};
use crate::config::{ConfigError, GaugeConfig};
use crate::physics_engine;
use crate::processing::{
    BandpassFilter, PeakDetector, PeakResult, ProcessingError, SampleBuffer, SampleWindow,
    SpectrumAnalyzer,
};
use crate::types::{CalibrationParams, DisplayState, Sample, UnitSpec, UnitTable, WeightReading};

/// Result of analyzing one window, before unit scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowAnalysis {
    pub peak: PeakResult,
    pub period_s: f64,
    pub raw_kg: f64,
    pub sample_rate_hz: f64,
    pub window_len: usize,
}

/// Owns all mutable pipeline state. One instance per tracked scale.
pub struct PipelineCoordinator {
    buffer: SampleBuffer,
    analyzer: SpectrumAnalyzer,
    band: BandpassFilter,
    peak_detector: PeakDetector,
    calibration: CalibrationParams,
    units: UnitTable,
    unit_id: String,
    unit: UnitSpec,
    tare: TareState,
    state: PipelineState,
    display: DisplayState,
    /// Latest analysis of the current tracking session
    last_analysis: Option<WindowAnalysis>,
    stats: PipelineStats,
}

impl PipelineCoordinator {
    /// Build a fully configured coordinator.
    ///
    /// The config is validated first; nothing is partially initialized.
    pub fn new(config: &GaugeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let buffer = SampleBuffer::new(config.buffer.window_sizes.clone())
            .map_err(|e| ConfigError::Validation(vec![format!("buffer.window_sizes: {e}")]))?;
        let unit = config.active_unit().ok_or_else(|| {
            ConfigError::Validation(vec![format!(
                "display.unit '{}' is not defined under [units]",
                config.display.unit
            )])
        })?;

        info!(
            stiffness = config.calibration.spring_stiffness_n_per_m,
            spring_mass = config.calibration.spring_mass_kg,
            pan_mass = config.calibration.pan_mass_kg,
            band_low = config.band.lower_hz,
            band_high = config.band.higher_hz,
            windows = ?buffer.window_sizes(),
            unit = %config.display.unit,
            "Pipeline coordinator ready"
        );

        Ok(Self {
            buffer,
            analyzer: SpectrumAnalyzer::new(),
            band: BandpassFilter::new(config.band.lower_hz, config.band.higher_hz),
            peak_detector: PeakDetector::new(),
            calibration: config.calibration_params(),
            units: config.units.clone(),
            unit_id: config.display.unit.clone(),
            unit,
            tare: TareState::default(),
            state: PipelineState::Idle,
            display: DisplayState::NotAvailable,
            last_analysis: None,
            stats: PipelineStats::default(),
        })
    }

    /// Apply one queued command.
    ///
    /// Returns a reading only when a sample completed an analysis window.
    pub fn handle(
        &mut self,
        command: PipelineCommand,
    ) -> Result<Option<WeightReading>, ProcessingError> {
        match command {
            PipelineCommand::Sample(sample) => self.push_sample(sample),
            PipelineCommand::Control(control) => {
                self.stats.controls_handled += 1;
                self.apply_control(control).map(|_| None)
            }
            PipelineCommand::EndOfStream => Ok(None),
        }
    }

    /// STEP 1-5 for a single incoming sample.
    pub fn push_sample(&mut self, sample: Sample) -> Result<Option<WeightReading>, ProcessingError> {
        if let Err(e) = self.buffer.append(sample) {
            self.stats.samples_rejected += 1;
            return Err(e);
        }

        match self.state {
            PipelineState::Idle => {
                self.state = PipelineState::Tracking;
                if self.display == DisplayState::NotAvailable {
                    self.display = DisplayState::Computing;
                }
            }
            PipelineState::Measuring => self.state = PipelineState::Tracking,
            PipelineState::Tracking => {}
        }

        let Some(n) = self.buffer.triggered_window() else {
            return Ok(None);
        };
        let window = match self.buffer.window(n) {
            Some(w) => w,
            None => return Ok(None),
        };
        self.buffer.trim();

        self.stats.analyses_run += 1;
        let analysis = match self.analyze_window(&window) {
            Ok(a) => a,
            Err(e) => {
                self.stats.analyses_failed += 1;
                return Err(e);
            }
        };

        self.last_analysis = Some(analysis);
        self.state = PipelineState::Measuring;
        let reading = self.render(&analysis);
        self.display = DisplayState::Value(reading.clone());
        self.stats.readings_emitted += 1;
        Ok(Some(reading))
    }

    /// STEP 4-5 on an arbitrary window, without touching pipeline state.
    pub fn analyze_window(
        &mut self,
        window: &SampleWindow,
    ) -> Result<WindowAnalysis, ProcessingError> {
        let spectrum = self.analyzer.analyze(window)?;
        let filtered = self.band.filter(&spectrum)?;
        let peak = self
            .peak_detector
            .peak(&filtered)
            .ok_or(ProcessingError::EmptyBand {
                lower_hz: self.band.lower_hz(),
                higher_hz: self.band.higher_hz(),
                resolution_hz: spectrum.resolution(),
            })?;
        let period_s = physics_engine::period_from_frequency(peak.frequency)?;
        let raw_kg = physics_engine::raw_weight_kg(period_s, &self.calibration);

        debug!(
            window = window.len(),
            fps = spectrum.sample_rate,
            bins = filtered.band_width_bins(),
            peak_hz = peak.frequency,
            magnitude = peak.magnitude,
            raw_kg,
            "Window analyzed"
        );

        Ok(WindowAnalysis {
            peak,
            period_s,
            raw_kg,
            sample_rate_hz: spectrum.sample_rate,
            window_len: window.len(),
        })
    }

    pub fn apply_control(&mut self, control: ControlCommand) -> Result<(), ProcessingError> {
        match control {
            ControlCommand::Reset => {
                self.reset();
                Ok(())
            }
            ControlCommand::Zero => self.zero(),
            ControlCommand::BeginTracking => {
                self.begin_tracking();
                Ok(())
            }
            ControlCommand::SetUnit { unit } => self.set_unit(&unit),
        }
    }

    /// Back to Idle: empty buffer, no tare, nothing on the display.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.tare = TareState::default();
        self.last_analysis = None;
        self.state = PipelineState::Idle;
        self.display = DisplayState::NotAvailable;
        info!("Pipeline reset");
    }

    /// New target: restart accumulation but keep the tare.
    pub fn begin_tracking(&mut self) {
        self.buffer.clear();
        self.last_analysis = None;
        self.state = PipelineState::Tracking;
        self.display = DisplayState::Computing;
        info!("Tracking new target");
    }

    /// Capture the latest raw weight as the tare.
    ///
    /// Needs a reading from the current tracking session. That reading stays
    /// valid after the pipeline drops back to `Tracking` between thresholds,
    /// so a tare is accepted in either state. Only `Idle`, or `Tracking`
    /// before the first threshold, returns `NoMeasurement`.
    pub fn zero(&mut self) -> Result<(), ProcessingError> {
        let analysis = self.last_analysis.ok_or(ProcessingError::NoMeasurement)?;
        self.tare.zero_adjustment = analysis.raw_kg;
        self.display = DisplayState::Value(self.render(&analysis));
        info!(zero_adjustment_kg = analysis.raw_kg, "Tare captured");
        Ok(())
    }

    /// Switch the display unit. Affects formatting only.
    pub fn set_unit(&mut self, unit_id: &str) -> Result<(), ProcessingError> {
        let spec = self
            .units
            .get(unit_id)
            .copied()
            .ok_or_else(|| ProcessingError::UnknownUnit(unit_id.to_string()))?;
        self.unit_id = unit_id.to_string();
        self.unit = spec;
        if let Some(analysis) = self.last_analysis {
            self.display = DisplayState::Value(self.render(&analysis));
        }
        info!(unit = unit_id, "Display unit changed");
        Ok(())
    }

    fn render(&self, analysis: &WindowAnalysis) -> WeightReading {
        let value = physics_engine::weight(
            analysis.period_s,
            &self.calibration,
            self.tare.zero_adjustment,
            self.unit.ratio,
        );
        WeightReading {
            value,
            raw_kg: analysis.raw_kg,
            unit: self.unit_id.clone(),
            fractional_digits: self.unit.fractional_digits,
            peak_frequency_hz: analysis.peak.frequency,
            peak_magnitude: analysis.peak.magnitude,
            period_s: analysis.period_s,
            window_len: analysis.window_len,
            sample_rate_hz: analysis.sample_rate_hz,
            computed_at: Utc::now(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn tare(&self) -> TareState {
        self.tare
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn last_analysis(&self) -> Option<&WindowAnalysis> {
        self.last_analysis.as_ref()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics_engine::period_for_mass;
    use std::f64::consts::PI;

    const FPS: f64 = 30.0;

    fn coordinator() -> PipelineCoordinator {
        PipelineCoordinator::new(&GaugeConfig::default()).expect("default config is valid")
    }

    /// Feed `count` samples of a clean oscillation at the period of `mass_kg`.
    fn feed(
        coord: &mut PipelineCoordinator,
        mass_kg: f64,
        start: usize,
        count: usize,
    ) -> Vec<WeightReading> {
        let calib = GaugeConfig::default().calibration_params();
        let freq = 1.0 / period_for_mass(mass_kg, &calib);
        let mut readings = Vec::new();
        for i in start..start + count {
            let t = i as f64 / FPS;
            let y = 0.5 + 0.03 * (2.0 * PI * freq * t).sin();
            if let Some(r) = coord.push_sample(Sample::new(y, t)).expect("sample accepted") {
                readings.push(r);
            }
        }
        readings
    }

    #[test]
    fn test_readings_at_each_threshold() {
        let mut coord = coordinator();
        let readings = feed(&mut coord, 0.1, 0, 256);
        let lens: Vec<usize> = readings.iter().map(|r| r.window_len).collect();
        assert_eq!(lens, vec![32, 64, 128, 256]);
        assert_eq!(coord.buffer_len(), 63);
        assert_eq!(coord.state(), PipelineState::Measuring);
    }

    #[test]
    fn test_weight_close_to_true_mass() {
        let mut coord = coordinator();
        let readings = feed(&mut coord, 0.1, 0, 256);
        let last = readings.last().unwrap();
        // 256 frames at 30 fps: bin width 0.117 Hz around ~5 Hz
        assert_eq!(last.unit, "g");
        assert!(
            (last.raw_kg - 0.1).abs() < 0.01,
            "raw {} kg, peak {} Hz",
            last.raw_kg,
            last.peak_frequency_hz
        );
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut coord = coordinator();
        assert_eq!(coord.state(), PipelineState::Idle);
        assert_eq!(coord.display(), &DisplayState::NotAvailable);

        feed(&mut coord, 0.1, 0, 1);
        assert_eq!(coord.state(), PipelineState::Tracking);
        assert_eq!(coord.display(), &DisplayState::Computing);

        feed(&mut coord, 0.1, 1, 31);
        assert_eq!(coord.state(), PipelineState::Measuring);
        assert!(matches!(coord.display(), DisplayState::Value(_)));

        feed(&mut coord, 0.1, 32, 1);
        assert_eq!(coord.state(), PipelineState::Tracking);
        // Previous value stays up while tracking continues
        assert!(matches!(coord.display(), DisplayState::Value(_)));

        coord.reset();
        assert_eq!(coord.state(), PipelineState::Idle);
        assert_eq!(coord.buffer_len(), 0);
        assert_eq!(coord.display().render(), "-");
    }

    #[test]
    fn test_zero_requires_measurement() {
        let mut coord = coordinator();
        assert_eq!(coord.zero(), Err(ProcessingError::NoMeasurement));
        feed(&mut coord, 0.1, 0, 10);
        assert_eq!(coord.zero(), Err(ProcessingError::NoMeasurement));
        assert_eq!(coord.tare().zero_adjustment, 0.0);
    }

    #[test]
    fn test_zero_accepted_while_tracking_between_thresholds() {
        let mut coord = coordinator();
        feed(&mut coord, 0.1, 0, 40);
        assert_eq!(coord.state(), PipelineState::Tracking);

        let raw = coord.last_analysis().unwrap().raw_kg;
        coord.zero().unwrap();
        assert_eq!(coord.tare().zero_adjustment, raw);
        assert_eq!(coord.state(), PipelineState::Tracking);
    }

    #[test]
    fn test_zero_then_same_measurement_reads_zero() {
        let mut coord = coordinator();
        feed(&mut coord, 0.1, 0, 64);
        let raw = coord.last_analysis().unwrap().raw_kg;
        coord.zero().unwrap();
        assert_eq!(coord.tare().zero_adjustment, raw);

        match coord.display() {
            DisplayState::Value(r) => assert!(r.value.abs() < 1e-9),
            other => panic!("unexpected display {:?}", other),
        }
        let window_analysis = *coord.last_analysis().unwrap();
        let reading = coord.render(&window_analysis);
        assert!(reading.value.abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_tare_but_begin_tracking_keeps_it() {
        let mut coord = coordinator();
        feed(&mut coord, 0.1, 0, 32);
        coord.zero().unwrap();
        let tare = coord.tare();

        coord.begin_tracking();
        assert_eq!(coord.tare(), tare);
        assert_eq!(coord.buffer_len(), 0);
        assert_eq!(coord.display().render(), "Computing...");
        assert_eq!(coord.zero(), Err(ProcessingError::NoMeasurement));

        coord.reset();
        assert_eq!(coord.tare().zero_adjustment, 0.0);
    }

    #[test]
    fn test_set_unit_changes_formatting_only() {
        let mut coord = coordinator();
        feed(&mut coord, 0.1, 0, 64);
        let before = *coord.last_analysis().unwrap();

        coord.set_unit("kg").unwrap();
        assert_eq!(coord.unit_id(), "kg");
        assert_eq!(coord.last_analysis().unwrap(), &before);
        match coord.display() {
            DisplayState::Value(r) => {
                assert_eq!(r.fractional_digits, 3);
                assert!((r.value - before.raw_kg).abs() < 1e-12);
            }
            other => panic!("unexpected display {:?}", other),
        }

        assert_eq!(
            coord.set_unit("stone"),
            Err(ProcessingError::UnknownUnit("stone".to_string()))
        );
        assert_eq!(coord.unit_id(), "kg");
    }

    #[test]
    fn test_out_of_order_sample_counted_and_rejected() {
        let mut coord = coordinator();
        coord.push_sample(Sample::new(0.5, 1.0)).unwrap();
        let err = coord.push_sample(Sample::new(0.5, 0.5)).unwrap_err();
        assert!(matches!(err, ProcessingError::OutOfOrderSamples { .. }));
        assert_eq!(coord.stats().samples_rejected, 1);
        assert_eq!(coord.buffer_len(), 1);
    }

    #[test]
    fn test_empty_band_withholds_reading() {
        // 2000 fps over 32 samples: 62.5 Hz bins, nothing inside 0.5-50 Hz
        let mut coord = coordinator();
        let mut last = Ok(None);
        for i in 0..32 {
            last = coord.push_sample(Sample::new((i % 2) as f64, i as f64 / 2000.0));
        }
        assert!(matches!(last, Err(ProcessingError::EmptyBand { .. })));
        assert_eq!(coord.stats().analyses_failed, 1);
        assert_eq!(coord.state(), PipelineState::Tracking);
        assert_eq!(coord.display(), &DisplayState::Computing);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = GaugeConfig::default();
        config.display.unit = "stone".to_string();
        assert!(PipelineCoordinator::new(&config).is_err());
    }
}
