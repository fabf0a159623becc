//! Scheduling policies and the per-core ready structures implementing them.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::job::JobRegistry;

/// Scheduling policy of a core.
///
/// The policy only describes the discipline; the mutable ready structure built
/// from it lives inside the core (see [`ReadyQueue`]). MLFQ composes the other
/// variants: each of its levels runs one non-MLFQ discipline under its own
/// quantum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Policy {
    /// First-come, first-serve, non-preemptive.
    Fcfs,
    /// Shortest job first, non-preemptive.
    SjfNp,
    /// Round robin with a fixed time quantum.
    Rr {
        /// Maximum consecutive ticks a job may hold the core.
        quantum: u64,
    },
    /// Smallest priority value first, non-preemptive.
    PriorityNp,
    /// Multi-level feedback queue with demotion on quantum exhaustion.
    Mlfq {
        /// Time quantum of each level, highest-priority level first.
        quanta: Vec<u64>,
        /// Selection discipline of each level. Must not contain `Mlfq`; an
        /// `Rr` entry contributes only FIFO order, the level quantum from
        /// `quanta` is authoritative.
        sub_policies: Vec<Policy>,
    },
}

impl Policy {
    /// Returns a string with the policy name and parameters.
    pub fn name(&self) -> String {
        match self {
            Policy::Fcfs => "FCFS".to_string(),
            Policy::SjfNp => "SJF".to_string(),
            Policy::Rr { quantum } => format!("RR[quantum={}]", quantum),
            Policy::PriorityNp => "Priority".to_string(),
            Policy::Mlfq { quanta, sub_policies } => {
                let quanta: Vec<_> = quanta.iter().map(|q| q.to_string()).collect();
                let subs: Vec<_> = sub_policies
                    .iter()
                    .map(|p| match p {
                        Policy::Rr { .. } => "RR".to_string(),
                        other => other.name(),
                    })
                    .collect();
                format!("MLFQ[quanta={},policies={}]", quanta.join(":"), subs.join(":"))
            }
        }
    }

    /// Checks the static constraints on policy parameters and returns the
    /// first violation as a human-readable reason.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Policy::Rr { quantum } => {
                if *quantum == 0 {
                    return Err("RR quantum must be positive".to_string());
                }
                Ok(())
            }
            Policy::Mlfq { quanta, sub_policies } => {
                if quanta.is_empty() {
                    return Err("MLFQ must have at least one level".to_string());
                }
                if quanta.len() != sub_policies.len() {
                    return Err(format!(
                        "MLFQ has {} quanta for {} sub-policies",
                        quanta.len(),
                        sub_policies.len()
                    ));
                }
                if quanta.iter().any(|q| *q == 0) {
                    return Err("MLFQ level quantum must be positive".to_string());
                }
                for sub in sub_policies {
                    if let Policy::Mlfq { .. } = sub {
                        return Err("MLFQ levels cannot nest another MLFQ".to_string());
                    }
                    sub.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Selected job together with the execution bound it was dispatched under.
pub(crate) struct Dispatch {
    /// Internal job id.
    pub job: usize,
    /// Quantum budget, `None` for non-preemptive disciplines.
    pub quantum: Option<u64>,
    /// MLFQ level the job was taken from, `None` outside MLFQ.
    pub level: Option<usize>,
}

// Ready jobs of one discipline. Scan-based variants pick by a full key ending
// with pid, so selection is total and the storage order does not matter.
pub(crate) enum SubQueue {
    Fifo(VecDeque<usize>),
    MinArrival(Vec<usize>),
    MinBurst(Vec<usize>),
    MinPriority(Vec<usize>),
}

impl SubQueue {
    fn new(policy: &Policy) -> Self {
        match policy {
            Policy::Fcfs => SubQueue::MinArrival(Vec::new()),
            Policy::SjfNp => SubQueue::MinBurst(Vec::new()),
            Policy::Rr { .. } => SubQueue::Fifo(VecDeque::new()),
            Policy::PriorityNp => SubQueue::MinPriority(Vec::new()),
            Policy::Mlfq { .. } => unreachable!("MLFQ cannot be a sub-queue discipline"),
        }
    }

    fn push(&mut self, job: usize) {
        match self {
            SubQueue::Fifo(fifo) => fifo.push_back(job),
            SubQueue::MinArrival(pool) | SubQueue::MinBurst(pool) | SubQueue::MinPriority(pool) => {
                pool.push(job)
            }
        }
    }

    fn take(&mut self, registry: &JobRegistry) -> Option<usize> {
        fn take_min<K: Ord>(pool: &mut Vec<usize>, key: impl Fn(usize) -> K) -> Option<usize> {
            let pos = pool
                .iter()
                .enumerate()
                .min_by_key(|(_, &id)| key(id))
                .map(|(pos, _)| pos)?;
            Some(pool.remove(pos))
        }
        match self {
            SubQueue::Fifo(fifo) => fifo.pop_front(),
            SubQueue::MinArrival(pool) => {
                take_min(pool, |id| (registry[id].arrival_time, registry[id].pid))
            }
            SubQueue::MinBurst(pool) => take_min(pool, |id| {
                let job = &registry[id];
                (job.burst_time, job.arrival_time, job.pid)
            }),
            SubQueue::MinPriority(pool) => take_min(pool, |id| {
                let job = &registry[id];
                (job.priority, job.arrival_time, job.pid)
            }),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SubQueue::Fifo(fifo) => fifo.is_empty(),
            SubQueue::MinArrival(pool) | SubQueue::MinBurst(pool) | SubQueue::MinPriority(pool) => {
                pool.is_empty()
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            SubQueue::Fifo(fifo) => fifo.len(),
            SubQueue::MinArrival(pool) | SubQueue::MinBurst(pool) | SubQueue::MinPriority(pool) => {
                pool.len()
            }
        }
    }
}

pub(crate) struct MlfqLevel {
    quantum: u64,
    queue: SubQueue,
}

/// Mutable ready structure of one core, built from a validated [`Policy`].
pub(crate) enum ReadyQueue {
    Single { queue: SubQueue, quantum: Option<u64> },
    Mlfq { levels: Vec<MlfqLevel> },
}

impl ReadyQueue {
    pub fn new(policy: &Policy) -> Self {
        match policy {
            Policy::Mlfq { quanta, sub_policies } => ReadyQueue::Mlfq {
                levels: quanta
                    .iter()
                    .zip(sub_policies.iter())
                    .map(|(&quantum, sub)| MlfqLevel {
                        quantum,
                        queue: SubQueue::new(sub),
                    })
                    .collect(),
            },
            Policy::Rr { quantum } => ReadyQueue::Single {
                queue: SubQueue::new(policy),
                quantum: Some(*quantum),
            },
            other => ReadyQueue::Single {
                queue: SubQueue::new(other),
                quantum: None,
            },
        }
    }

    /// Admits an arrived job. New MLFQ jobs always enter the top level.
    pub fn push(&mut self, job: usize) {
        match self {
            ReadyQueue::Single { queue, .. } => queue.push(job),
            ReadyQueue::Mlfq { levels } => levels[0].queue.push(job),
        }
    }

    /// Selects the next job to run, removing it from the ready structure.
    ///
    /// MLFQ scans its levels from the top; the first non-empty level supplies
    /// the job under its own discipline and quantum.
    pub fn take_next(&mut self, registry: &JobRegistry) -> Option<Dispatch> {
        match self {
            ReadyQueue::Single { queue, quantum } => queue.take(registry).map(|job| Dispatch {
                job,
                quantum: *quantum,
                level: None,
            }),
            ReadyQueue::Mlfq { levels } => {
                for (k, level) in levels.iter_mut().enumerate() {
                    if let Some(job) = level.queue.take(registry) {
                        return Some(Dispatch {
                            job,
                            quantum: Some(level.quantum),
                            level: Some(k),
                        });
                    }
                }
                None
            }
        }
    }

    /// Returns a preempted job to the ready structure.
    ///
    /// Under RR the job goes to the FIFO tail; under MLFQ it is demoted to the
    /// tail of the next lower level (jobs preempted on the last level stay
    /// there).
    pub fn requeue(&mut self, job: usize, level: Option<usize>) {
        match self {
            ReadyQueue::Single { queue, .. } => queue.push(job),
            ReadyQueue::Mlfq { levels } => {
                let next = match level {
                    Some(k) => (k + 1).min(levels.len() - 1),
                    None => levels.len() - 1,
                };
                levels[next].queue.push(job);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ReadyQueue::Single { queue, .. } => queue.is_empty(),
            ReadyQueue::Mlfq { levels } => levels.iter().all(|level| level.queue.is_empty()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReadyQueue::Single { queue, .. } => queue.len(),
            ReadyQueue::Mlfq { levels } => levels.iter().map(|level| level.queue.len()).sum(),
        }
    }
}
