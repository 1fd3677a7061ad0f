//! Telemetry Recorder
//!
//! Passive observer of workflow execution. The engine hands events to a
//! `TelemetrySink`; sinks are fire-and-forget and can never affect a run.
//!
//! `TelemetryRecorder` feeds a bounded channel consumed by a background task
//! that aggregates per-stage timings. A full channel drops the event instead
//! of blocking the run.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use story_forge_core::WorkflowStage;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::models::run::RunOutcome;
use crate::models::strategy::GenerationStrategy;

// ============================================================================
// Events
// ============================================================================

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    Failed,
}

/// Event emitted by the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A stage finished
    Stage {
        run_id: Uuid,
        stage: WorkflowStage,
        duration_ms: u64,
        outcome: StageOutcome,
    },
    /// A run reached a terminal state
    RunCompleted {
        run_id: Uuid,
        outcome: RunOutcome,
        strategy: Option<GenerationStrategy>,
        pass_count: u32,
        final_score: Option<f64>,
        duration_ms: u64,
    },
}

/// Write-only telemetry destination.
pub trait TelemetrySink: Send + Sync {
    /// Record an event. Must not block and must not fail.
    fn record(&self, event: TelemetryEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: TelemetryEvent) {}
}

// ============================================================================
// Aggregates
// ============================================================================

/// Timing statistics for one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStats {
    pub count: u64,
    pub failures: u64,
    pub total_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl StageStats {
    fn observe(&mut self, duration_ms: u64, outcome: StageOutcome) {
        if self.count == 0 {
            self.min_ms = duration_ms;
            self.max_ms = duration_ms;
        } else {
            self.min_ms = self.min_ms.min(duration_ms);
            self.max_ms = self.max_ms.max(duration_ms);
        }
        self.count += 1;
        self.total_ms = self.total_ms.saturating_add(duration_ms);
        if outcome == StageOutcome::Failed {
            self.failures += 1;
        }
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.count as f64
        }
    }
}

/// Point-in-time view of the recorder's aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    /// Keyed by stage name
    pub stages: BTreeMap<String, StageStats>,
    pub runs_completed: u64,
    /// Completed runs per outcome name
    pub outcomes: BTreeMap<String, u64>,
    /// Events lost to a full channel
    pub dropped_events: u64,
}

// ============================================================================
// Recorder
// ============================================================================

enum RecorderMessage {
    Event(TelemetryEvent),
    Snapshot(oneshot::Sender<TelemetrySnapshot>),
    Shutdown,
}

/// Channel-fed telemetry aggregator.
pub struct TelemetryRecorder {
    sender: mpsc::Sender<RecorderMessage>,
    dropped: std::sync::Arc<AtomicU64>,
}

impl TelemetryRecorder {
    /// Create a recorder and spawn its aggregation task. Must be called
    /// within a tokio runtime.
    pub fn new(buffer: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<RecorderMessage>(buffer.max(1));
        let dropped = std::sync::Arc::new(AtomicU64::new(0));

        let dropped_clone = dropped.clone();
        tokio::spawn(async move {
            Self::process_messages(receiver, dropped_clone).await;
        });

        Self { sender, dropped }
    }

    async fn process_messages(
        mut receiver: mpsc::Receiver<RecorderMessage>,
        dropped: std::sync::Arc<AtomicU64>,
    ) {
        let mut snapshot = TelemetrySnapshot::default();

        while let Some(message) = receiver.recv().await {
            match message {
                RecorderMessage::Event(event) => Self::apply(&mut snapshot, event),
                RecorderMessage::Snapshot(reply) => {
                    let mut view = snapshot.clone();
                    view.dropped_events = dropped.load(Ordering::Relaxed);
                    let _ = reply.send(view);
                }
                RecorderMessage::Shutdown => break,
            }
        }
        tracing::debug!("Telemetry recorder stopped");
    }

    fn apply(snapshot: &mut TelemetrySnapshot, event: TelemetryEvent) {
        match event {
            TelemetryEvent::Stage {
                stage,
                duration_ms,
                outcome,
                ..
            } => {
                snapshot
                    .stages
                    .entry(stage.as_str().to_string())
                    .or_default()
                    .observe(duration_ms, outcome);
            }
            TelemetryEvent::RunCompleted { outcome, .. } => {
                snapshot.runs_completed += 1;
                *snapshot.outcomes.entry(outcome.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Current aggregates. Includes every event recorded before the call.
    /// Returns `None` once the recorder has shut down.
    pub async fn snapshot(&self) -> Option<TelemetrySnapshot> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RecorderMessage::Snapshot(reply))
            .await
            .ok()?;
        response.await.ok()
    }

    /// Stop the aggregation task.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RecorderMessage::Shutdown).await;
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for TelemetryRecorder {
    fn record(&self, event: TelemetryEvent) {
        if self.sender.try_send(RecorderMessage::Event(event)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Telemetry channel full or closed, event dropped");
        }
    }
}
