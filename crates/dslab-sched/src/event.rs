//! Observable simulation events.
use serde::Serialize;

/// What happened on a core at some tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum EventKind {
    /// Job entered the ready structure of its core.
    Admit {
        /// External job identifier.
        pid: u32,
    },
    /// Job received the CPU.
    Dispatch {
        /// External job identifier.
        pid: u32,
    },
    /// Running job was returned to the ready structure before completion.
    Preempt {
        /// External job identifier.
        pid: u32,
    },
    /// Job finished.
    Complete {
        /// External job identifier.
        pid: u32,
    },
    /// Core had no arrived job to run.
    Idle,
}

impl EventKind {
    /// Returns the pid the event refers to, if any.
    pub fn pid(&self) -> Option<u32> {
        match self {
            EventKind::Admit { pid }
            | EventKind::Dispatch { pid }
            | EventKind::Preempt { pid }
            | EventKind::Complete { pid } => Some(*pid),
            EventKind::Idle => None,
        }
    }
}

/// A single entry of the simulation event stream.
///
/// Events are emitted in deterministic order: ascending tick, then ascending
/// core id, then the order of actions within [`crate::core::Core::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SimEvent {
    /// Tick the event occurred at.
    pub tick: u64,
    /// Core the event occurred on.
    pub core_id: usize,
    /// Event payload.
    pub kind: EventKind,
}
