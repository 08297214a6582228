//! Pipeline state, commands and statistics
//!
//! Everything that mutates the pipeline travels as a [`PipelineCommand`] on
//! one queue, so appends, resets, tare captures and unit changes are applied
//! in arrival order by a single consumer.

use serde::{Deserialize, Serialize};

use crate::types::Sample;

// ============================================================================
// State Machine
// ============================================================================

/// Lifecycle of a measurement session.
///
/// ```text
/// Idle ──sample──► Tracking ──threshold──► Measuring ──sample──► Tracking ...
///   ▲                                                               │
///   └──────────────────────────── reset ────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    /// No target, empty buffer
    #[default]
    Idle,
    /// Samples arriving, buffer filling
    Tracking,
    /// A window was just analyzed and a reading is available
    Measuring,
}

/// Tare offset, owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TareState {
    /// Raw weight (kg) subtracted from every reading
    pub zero_adjustment: f64,
}

// ============================================================================
// Commands
// ============================================================================

/// Operator action delivered alongside samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Clear the buffer and the tare, drop the target
    Reset,
    /// Capture the current raw weight as the tare
    Zero,
    /// New target selected: clear the buffer, keep the tare
    BeginTracking,
    /// Switch the display unit
    SetUnit { unit: String },
}

/// Single-writer queue item.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCommand {
    Sample(Sample),
    Control(ControlCommand),
    /// Producer reached the end of its source
    EndOfStream,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Observations read from the source
    pub samples_received: u64,
    /// Observations dropped for low tracker confidence
    pub samples_gated: u64,
    /// Samples refused by the buffer (out of order, non-finite)
    pub samples_rejected: u64,
    /// Windows handed to the analyzer
    pub analyses_run: u64,
    /// Analyses that ended in an error and produced no reading
    pub analyses_failed: u64,
    /// Readings delivered to the sink
    pub readings_emitted: u64,
    /// Control commands applied
    pub controls_handled: u64,
}
