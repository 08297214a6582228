//! Processing Pipeline Module
//!
//! ```text
//! source ──► ingest task ──(confidence gate)──► bounded queue ──► coordinator ──► sink
//!                                                   ▲
//!                          PipelineHandle ──────────┘  (reset / zero / set_unit)
//! ```
//!
//! The coordinator is the only owner of buffer, tare and unit state. Every
//! mutation reaches it through the queue.

mod state;
mod coordinator;
pub mod source;
pub mod processing_loop;

pub use state::*;
pub use coordinator::{PipelineCoordinator, WindowAnalysis};
pub use processing_loop::{LoopOutcome, PipelineHandle, ProcessingLoop, ReadingSink};
pub use source::{LineSource, ReplaySource, SampleSource, SourceEvent, StdinSource};
