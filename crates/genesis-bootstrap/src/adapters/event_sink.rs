//! Event sink adapters
//!
//! - `ChannelEventSink`: forwards events over a tokio channel to a consumer
//!   task (CLI renderer, API stream, ...)
//! - `TracingEventSink`: logs each event
//! - `RecordingEventSink`: keeps the trail in memory

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::events::{ProgressEvent, ProgressStatus};
use crate::ports::EventSink;

/// Sends events into an unbounded channel
///
/// Unbounded so that `send` never blocks the pipeline; the channel keeps
/// events in order.
#[derive(Clone, Debug)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver its events arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: ProgressEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!(event = %e.0, "Progress receiver closed, dropping event");
        }
    }
}

/// Logs events through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn send(&self, event: ProgressEvent) {
        match event.status() {
            ProgressStatus::Ongoing => info!(status = "ongoing", "{}", event.message()),
            ProgressStatus::Done => info!(status = "done", "{}", event.message()),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn send(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
