//! Shared data structures for the spring-scale pipeline
//!
//! - Sample: timestamped position from the external tracker
//! - CalibrationParams: spring constants fixed per device
//! - UnitSpec / UnitTable: output unit conversion and formatting
//! - WeightReading / DisplayState: what the pipeline hands to the display

mod sample;
mod calibration;
mod units;
mod reading;

pub use sample::*;
pub use calibration::*;
pub use units::*;
pub use reading::*;
