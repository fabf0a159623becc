//! Sinks for the simulation event stream.
use std::fs::File;

use serde::Serialize;
use serde_json::json;

use crate::event::{EventKind, SimEvent};
use crate::log_debug;

/// Consumer of [`SimEvent`]s.
///
/// The simulator guarantees the emission order of events; what a logger does
/// with them (drop, print, buffer) is up to the implementation.
pub trait EventLogger {
    /// Records one event.
    fn record(&mut self, event: SimEvent);

    /// Saves buffered events to a file, if the logger buffers any.
    fn save_log(&self, _path: &str) -> Result<(), std::io::Error> {
        Ok(())
    }
}

/// Discards all events.
#[derive(Default)]
pub struct NullLogger {}

impl NullLogger {
    /// Creates a new NullLogger.
    pub fn new() -> Self {
        Self {}
    }
}

impl EventLogger for NullLogger {
    fn record(&mut self, _event: SimEvent) {}
}

/// Forwards events to the `log` facade at debug level.
#[derive(Default)]
pub struct StdoutLogger {}

impl StdoutLogger {
    /// Creates a new StdoutLogger.
    pub fn new() -> Self {
        Self {}
    }
}

impl EventLogger for StdoutLogger {
    fn record(&mut self, event: SimEvent) {
        let name = format!("core-{}", event.core_id);
        log_debug!(event.tick, name.as_str(), "{}", json!(event.kind));
    }
}

#[derive(Serialize)]
struct LogEntry {
    tick: u64,
    core_id: usize,
    event: &'static str,
    pid: Option<u32>,
}

/// Buffers events in memory and can save them as CSV.
#[derive(Default)]
pub struct FileLogger {
    events: Vec<SimEvent>,
}

impl FileLogger {
    /// Creates a new FileLogger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffered events in emission order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }
}

impl EventLogger for FileLogger {
    fn record(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    fn save_log(&self, path: &str) -> Result<(), std::io::Error> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for event in &self.events {
            let name = match event.kind {
                EventKind::Admit { .. } => "admit",
                EventKind::Dispatch { .. } => "dispatch",
                EventKind::Preempt { .. } => "preempt",
                EventKind::Complete { .. } => "complete",
                EventKind::Idle => "idle",
            };
            wtr.serialize(LogEntry {
                tick: event.tick,
                core_id: event.core_id,
                event: name,
                pid: event.kind.pid(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
