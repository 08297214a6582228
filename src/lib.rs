//! Video Scale: weighing by watching a spring oscillate
//!
//! A camera tracks the pan of a spring scale. The vertical position trace is
//! buffered, transformed to the frequency domain, band-limited, and the
//! dominant oscillation period is converted to a mass with a spring-mass
//! model that accounts for the spring's own mass and the pan.
//!
//! ## Architecture
//!
//! - **Processing**: sample buffer, real FFT, bandpass, peak detection
//! - **Physics Engine**: period ↔ mass spring model
//! - **Pipeline**: single-consumer command queue, state machine, sources
//! - **Acquisition**: CSV replay, synthetic oscillation, confidence gate

pub mod acquisition;
pub mod config;
pub mod physics_engine;
pub mod pipeline;
pub mod processing;
pub mod types;

// Re-export gauge configuration
pub use config::{ConfigError, GaugeConfig};

// Re-export commonly used types
pub use types::{
    CalibrationParams, DisplayState, Observation, Sample, UnitSpec, UnitTable, WeightReading,
};

// Re-export pipeline components
pub use pipeline::{
    ControlCommand, PipelineCommand, PipelineCoordinator, PipelineHandle, PipelineState,
    PipelineStats, ProcessingLoop, ReadingSink,
};

// Re-export processing stages
pub use processing::{
    BandpassFilter, PeakDetector, PeakResult, ProcessingError, SampleBuffer, SampleWindow,
    Spectrum, SpectrumAnalyzer,
};
