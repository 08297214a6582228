//! Producer/consumer processing loop shared across all input modes.
//!
//! An ingest task reads the source, drops low-confidence frames and forwards
//! everything else as [`PipelineCommand`]s on a bounded channel. The consumer
//! owns the [`PipelineCoordinator`] and applies commands one at a time, so a
//! reset or tare request can never interleave with a half-finished append.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::source::{SampleSource, SourceEvent};
use super::{ControlCommand, PipelineCommand, PipelineCoordinator, PipelineStats};
use crate::acquisition::passes_confidence;
use crate::config::TrackingConfig;
use crate::processing::ProcessingError;
use crate::types::{DisplayState, Sample, WeightReading};

// ============================================================================
// Reading Sink
// ============================================================================

/// Receives pipeline output.
///
/// Pass `()` when only the returned statistics matter.
pub trait ReadingSink: Send + 'static {
    /// Called once per completed analysis.
    fn on_reading(&mut self, reading: &WeightReading);

    /// Called whenever what a display should show changes.
    fn on_display(&mut self, _display: &DisplayState) {}
}

impl ReadingSink for () {
    fn on_reading(&mut self, _reading: &WeightReading) {}
}

/// Collects readings in memory.
impl ReadingSink for Vec<WeightReading> {
    fn on_reading(&mut self, reading: &WeightReading) {
        self.push(reading.clone());
    }
}

// ============================================================================
// Pipeline Handle
// ============================================================================

/// Sender side of the command queue for callers outside the source, such as
/// a UI thread. Commands are applied in arrival order with the samples.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<PipelineCommand>,
}

impl PipelineHandle {
    pub async fn send(&self, command: PipelineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| anyhow!("pipeline is no longer running"))
    }

    pub async fn push_sample(&self, sample: Sample) -> Result<()> {
        self.send(PipelineCommand::Sample(sample)).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(PipelineCommand::Control(ControlCommand::Reset)).await
    }

    pub async fn zero(&self) -> Result<()> {
        self.send(PipelineCommand::Control(ControlCommand::Zero)).await
    }

    pub async fn begin_tracking(&self) -> Result<()> {
        self.send(PipelineCommand::Control(ControlCommand::BeginTracking))
            .await
    }

    pub async fn set_unit(&self, unit: impl Into<String>) -> Result<()> {
        self.send(PipelineCommand::Control(ControlCommand::SetUnit {
            unit: unit.into(),
        }))
        .await
    }

    /// Ask the consumer to stop after everything already queued.
    pub async fn finish(&self) -> Result<()> {
        self.send(PipelineCommand::EndOfStream).await
    }
}

// ============================================================================
// Processing Loop
// ============================================================================

/// What a finished run hands back.
pub struct LoopOutcome<K> {
    pub stats: PipelineStats,
    pub sink: K,
    /// Display state when the loop stopped
    pub display: DisplayState,
}

/// Owns the coordinator, the sink and the command queue.
///
/// Built with [`new()`](ProcessingLoop::new), then consumed by
/// [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop<K: ReadingSink> {
    coordinator: PipelineCoordinator,
    sink: K,
    cancel_token: CancellationToken,
    min_confidence: f64,
    tx: mpsc::Sender<PipelineCommand>,
    rx: mpsc::Receiver<PipelineCommand>,
}

impl<K: ReadingSink> ProcessingLoop<K> {
    pub fn new(
        coordinator: PipelineCoordinator,
        sink: K,
        tracking: &TrackingConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(tracking.channel_capacity.max(1));
        Self {
            coordinator,
            sink,
            cancel_token,
            min_confidence: tracking.min_confidence,
            tx,
            rx,
        }
    }

    /// Additional writer for the command queue.
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run until the source is exhausted, every sender is gone, or cancellation.
    pub async fn run<S: SampleSource>(self, source: S) -> LoopOutcome<K> {
        let ProcessingLoop {
            mut coordinator,
            mut sink,
            cancel_token,
            min_confidence,
            tx,
            mut rx,
        } = self;

        info!("📊 Processing frames from {}...", source.source_name());
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        // Stopped separately so the producer also ends when only the consumer does
        let ingest_token = cancel_token.child_token();
        let producer = tokio::spawn(ingest(source, tx, min_confidence, ingest_token.clone()));

        let mut shown = coordinator.display().clone();
        let mut commands = 0u64;

        loop {
            let command = tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    break;
                }
                received = rx.recv() => match received {
                    Some(cmd) => cmd,
                    None => {
                        info!("[ProcessingLoop] Command channel closed");
                        break;
                    }
                },
            };

            if command == PipelineCommand::EndOfStream {
                info!("[ProcessingLoop] Source reached end ({} commands applied)", commands);
                break;
            }
            commands += 1;

            match coordinator.handle(command) {
                Ok(Some(reading)) => {
                    log_reading(&reading);
                    sink.on_reading(&reading);
                }
                Ok(None) => {}
                Err(e) => log_withheld(&e),
            }

            if coordinator.display() != &shown {
                shown = coordinator.display().clone();
                sink.on_display(&shown);
            }

            if commands % 256 == 0 {
                let s = coordinator.stats();
                debug!(
                    commands,
                    buffer = coordinator.buffer_len(),
                    analyses = s.analyses_run,
                    readings = s.readings_emitted,
                    "Progress"
                );
            }
        }

        // Wakes a producer parked in the source or on a full queue
        ingest_token.cancel();
        drop(rx);
        let ingested = match producer.await {
            Ok(s) => s,
            Err(e) => {
                warn!("[ProcessingLoop] Ingest task failed: {}", e);
                IngestStats::default()
            }
        };

        let mut stats = coordinator.stats();
        stats.samples_received = ingested.received;
        stats.samples_gated = ingested.gated;
        log_final_stats(&stats);

        LoopOutcome {
            stats,
            sink,
            display: coordinator.display().clone(),
        }
    }
}

// ============================================================================
// Ingest Task
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct IngestStats {
    received: u64,
    gated: u64,
}

async fn ingest<S: SampleSource>(
    mut source: S,
    tx: mpsc::Sender<PipelineCommand>,
    min_confidence: f64,
    cancel_token: CancellationToken,
) -> IngestStats {
    let mut stats = IngestStats::default();
    let name = source.source_name().to_string();

    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => return stats,
            result = source.next_event() => match result {
                Ok(ev) => ev,
                Err(e) => {
                    warn!("[Ingest] {} source error: {}", name, e);
                    break;
                }
            },
        };

        let command = match event {
            SourceEvent::Observation(obs) => {
                stats.received += 1;
                if !passes_confidence(&obs, min_confidence) {
                    stats.gated += 1;
                    continue;
                }
                PipelineCommand::Sample(obs.sample())
            }
            SourceEvent::Control(control) => PipelineCommand::Control(control),
            SourceEvent::Eof => break,
        };

        if tx.send(command).await.is_err() {
            return stats;
        }
    }

    let _ = tx.send(PipelineCommand::EndOfStream).await;
    stats
}

// ============================================================================
// Helpers
// ============================================================================

fn log_reading(reading: &WeightReading) {
    info!(
        window = reading.window_len,
        peak_hz = reading.peak_frequency_hz,
        fps = reading.sample_rate_hz,
        "⚖️  {}",
        reading
    );
}

/// Recoverable errors: warn and keep consuming.
fn log_withheld(error: &ProcessingError) {
    warn!(error = %error, "Reading withheld for this cycle");
}

fn log_final_stats(stats: &PipelineStats) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Frames Received:      {}", stats.samples_received);
    info!("   Frames Gated:         {}", stats.samples_gated);
    info!("   Samples Rejected:     {}", stats.samples_rejected);
    info!("   Analyses Run:         {}", stats.analyses_run);
    info!("   Analyses Failed:      {}", stats.analyses_failed);
    info!("   Readings Emitted:     {}", stats.readings_emitted);
    info!("   Controls Applied:     {}", stats.controls_handled);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GaugeConfig;
    use crate::pipeline::source::{LineSource, ReplaySource};
    use std::time::Duration;
    use tokio::io::BufReader;
    use crate::types::Observation;

    fn looped<K: ReadingSink>(sink: K) -> ProcessingLoop<K> {
        let config = GaugeConfig::default();
        let coordinator = PipelineCoordinator::new(&config).unwrap();
        ProcessingLoop::new(coordinator, sink, &config.tracking, CancellationToken::new())
    }

    fn frames(count: usize, confidence: f64) -> Vec<Observation> {
        (0..count)
            .map(|i| {
                let t = i as f64 / 30.0;
                Observation {
                    position: 0.5 + 0.03 * (2.0 * std::f64::consts::PI * 4.0 * t).sin(),
                    timestamp: t,
                    confidence,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_replay_produces_readings_at_thresholds() {
        let outcome = looped(Vec::<WeightReading>::new())
            .run(ReplaySource::new(frames(256, 1.0), 0))
            .await;
        let lens: Vec<usize> = outcome.sink.iter().map(|r| r.window_len).collect();
        assert_eq!(lens, vec![32, 64, 128, 256]);
        assert_eq!(outcome.stats.samples_received, 256);
        assert_eq!(outcome.stats.readings_emitted, 4);
        assert!(matches!(outcome.display, DisplayState::Value(_)));
    }

    #[tokio::test]
    async fn test_low_confidence_frames_never_reach_buffer() {
        let mut input = frames(40, 1.0);
        for obs in input.iter_mut().skip(20) {
            obs.confidence = 0.1;
        }
        let outcome = looped(()).run(ReplaySource::new(input, 0)).await;
        assert_eq!(outcome.stats.samples_received, 40);
        assert_eq!(outcome.stats.samples_gated, 20);
        assert_eq!(outcome.stats.analyses_run, 0);
        assert_eq!(outcome.display, DisplayState::Computing);
    }

    #[tokio::test]
    async fn test_cancellation_stops_loop() {
        let config = GaugeConfig::default();
        let token = CancellationToken::new();
        let pipeline = ProcessingLoop::new(
            PipelineCoordinator::new(&config).unwrap(),
            (),
            &config.tracking,
            token.clone(),
        );
        token.cancel();
        // Slow source: would take minutes without cancellation
        let outcome = pipeline.run(ReplaySource::new(frames(10_000, 1.0), 1_000)).await;
        assert!(outcome.stats.samples_received < 10_000);
    }

    #[tokio::test]
    async fn test_handle_commands_share_the_queue() {
        let pipeline = looped(Vec::<WeightReading>::new());
        let handle = pipeline.handle();
        for obs in frames(32, 1.0) {
            handle.push_sample(obs.sample()).await.unwrap();
        }
        handle.zero().await.unwrap();
        handle.set_unit("kg").await.unwrap();
        handle.finish().await.unwrap();

        // Empty source: EOF is queued behind the handle's commands
        let outcome = pipeline.run(ReplaySource::new(Vec::new(), 0)).await;
        assert_eq!(outcome.sink.len(), 1);
        assert_eq!(outcome.stats.controls_handled, 2);
        match outcome.display {
            DisplayState::Value(r) => {
                assert_eq!(r.unit, "kg");
                assert!(r.value.abs() < 1e-9);
            }
            other => panic!("unexpected display {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_finish_stops_run_while_source_is_idle() {
        let pipeline = looped(());
        let handle = pipeline.handle();
        handle.finish().await.unwrap();

        // Writer stays open: the source never yields a line or EOF
        let (_writer, reader) = tokio::io::duplex(64);
        let run = pipeline.run(LineSource::new(BufReader::new(reader)));
        let outcome = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run returns once EndOfStream is consumed");
        assert_eq!(outcome.stats.samples_received, 0);
        assert_eq!(outcome.display, DisplayState::NotAvailable);
    }

    #[tokio::test]
    async fn test_finish_stops_paced_replay() {
        let pipeline = looped(Vec::<WeightReading>::new());
        let handle = pipeline.handle();
        handle.finish().await.unwrap();

        // One frame per minute: only cancellation of the ingest task ends it
        let run = pipeline.run(ReplaySource::new(frames(100, 1.0), 60_000));
        let outcome = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("paced replay is interrupted");
        assert!(outcome.stats.samples_received < 100);
        assert!(outcome.sink.is_empty());
    }
}
