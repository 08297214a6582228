//! Observation source abstraction.
//!
//! Provides a unified trait for reading tracker output from different places:
//! pre-loaded frames (CSV replay, synthetic) and JSON lines on stdin.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use super::ControlCommand;
use crate::types::Observation;

/// Events produced by a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// One tracked frame, not yet confidence-gated.
    Observation(Observation),
    /// Operator action interleaved with the frames.
    Control(ControlCommand),
    /// No more data.
    Eof,
}

/// Trait abstracting where observations come from.
///
/// Implementations handle format parsing and pacing internally.
/// The ingest task calls [`next_event`](SampleSource::next_event) in a
/// `select!` with cancellation.
#[async_trait]
pub trait SampleSource: Send + 'static {
    /// Returns `SourceEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable errors.
    async fn next_event(&mut self) -> Result<SourceEvent>;

    /// Human-readable name for logging (e.g. "CSV", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source (CSV file / synthetic)
// ============================================================================

/// Replays pre-loaded observations with optional inter-frame delay.
pub struct ReplaySource {
    frames: std::vec::IntoIter<Observation>,
    delay_ms: u64,
    yielded_first: bool,
    name: &'static str,
}

impl ReplaySource {
    pub fn new(frames: Vec<Observation>, delay_ms: u64) -> Self {
        Self {
            frames: frames.into_iter(),
            delay_ms,
            yielded_first: false,
            name: "replay",
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_event(&mut self) -> Result<SourceEvent> {
        // No delay before the first frame
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.frames.next() {
            Some(obs) => {
                self.yielded_first = true;
                Ok(SourceEvent::Observation(obs))
            }
            None => Ok(SourceEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        self.name
    }
}

// ============================================================================
// Line Source (JSON lines: observations and control messages)
// ============================================================================

/// One input line: a control message or an observation.
#[derive(Deserialize)]
#[serde(untagged)]
enum Line {
    Control(ControlCommand),
    Observation(Observation),
}

/// Reads JSON lines from any async reader.
///
/// ```text
/// {"position":0.51,"timestamp":12.033,"confidence":0.92}
/// {"command":"set_unit","unit":"oz"}
/// ```
pub struct LineSource<R> {
    reader: R,
    line_buffer: String,
    name: &'static str,
}

/// JSON lines on standard input.
pub type StdinSource = LineSource<BufReader<Stdin>>;

impl LineSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin())).named("stdin")
    }
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(256),
            name: "json-lines",
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<R> SampleSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_event(&mut self) -> Result<SourceEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SourceEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Line>(line) {
                Ok(Line::Control(cmd)) => return Ok(SourceEvent::Control(cmd)),
                Ok(Line::Observation(obs)) => return Ok(SourceEvent::Observation(obs)),
                Err(e) => {
                    // Skip malformed lines and keep reading
                    tracing::warn!(source = self.name, error = %e, "Failed to parse input line");
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        self.name
    }
}
