//! Jobs and their run state.
use std::ops::{Index, IndexMut};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::simulation::Status;

/// Job status.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum JobStatus {
    /// Job is registered, but simulation time has not reached its arrival time yet.
    NotArrived,
    /// Job sits in the ready structure of its core.
    Ready,
    /// Job is executing on its core.
    Running,
    /// Job is finished.
    Finished,
}

/// Input record describing a single job.
///
/// Times are signed so that malformed inputs can be rejected with
/// [`Status::InvalidJob`] instead of wrapping around.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JobRequest {
    /// External job identifier, unique within one simulation.
    pub pid: u32,
    /// Tick at which the job becomes eligible to run, `>= 0`.
    pub arrival_time: i64,
    /// Total CPU ticks the job requires, `>= 1`.
    pub burst_time: i64,
    /// Job priority, smaller value means higher priority.
    #[serde(default)]
    pub priority: i32,
}

impl JobRequest {
    /// Creates a new job request.
    pub fn new(pid: u32, arrival_time: i64, burst_time: i64, priority: i32) -> Self {
        Self {
            pid,
            arrival_time,
            burst_time,
            priority,
        }
    }
}

/// Job with its run state.
#[derive(Clone, Copy, Debug)]
pub struct Job {
    /// Internal dense id (position in [`JobRegistry`]).
    pub id: usize,
    /// External job identifier.
    pub pid: u32,
    /// Tick at which the job becomes eligible to run.
    pub arrival_time: u64,
    /// Total CPU ticks the job requires.
    pub burst_time: u64,
    /// Job priority, smaller value means higher priority.
    pub priority: i32,
    /// CPU ticks left until completion.
    pub remaining_time: u64,
    /// Job status.
    pub status: JobStatus,
    /// Id of the core the job was assigned to.
    pub core_id: Option<usize>,
    /// Tick at which the job first received the CPU.
    pub start_time: Option<u64>,
    /// Tick at which the job finished.
    pub completion_time: Option<u64>,
}

impl Job {
    /// Returns job turnaround time (completion - arrival).
    pub fn turnaround_time(&self) -> u64 {
        self.completion_time.unwrap() - self.arrival_time
    }

    /// Returns job waiting time (turnaround - burst).
    pub fn waiting_time(&self) -> u64 {
        self.turnaround_time() - self.burst_time
    }
}

/// Stores all jobs of a simulation, indexed by internal id.
///
/// Cores refer to jobs by id and mutate their run state through this registry,
/// so a job is never aliased by more than one owner.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    /// Validates raw job requests and builds a registry.
    ///
    /// Jobs are stored in `(arrival_time, pid)` order, which is also the order
    /// the dispatcher walks when partitioning them across cores. The first
    /// per-field validation failure is returned as [`Status::InvalidJob`].
    pub fn from_requests(requests: &[JobRequest]) -> Result<Self, Status> {
        let mut seen = FxHashSet::default();
        for req in requests {
            if !seen.insert(req.pid) {
                return Err(Status::InvalidJob {
                    pid: req.pid,
                    reason: "duplicate pid".to_string(),
                });
            }
            if req.arrival_time < 0 {
                return Err(Status::InvalidJob {
                    pid: req.pid,
                    reason: format!("negative arrival time {}", req.arrival_time),
                });
            }
            if req.burst_time <= 0 {
                return Err(Status::InvalidJob {
                    pid: req.pid,
                    reason: format!("non-positive burst time {}", req.burst_time),
                });
            }
        }
        let mut ordered: Vec<_> = requests.to_vec();
        ordered.sort_by_key(|r| (r.arrival_time, r.pid));
        let jobs = ordered
            .iter()
            .enumerate()
            .map(|(id, req)| Job {
                id,
                pid: req.pid,
                arrival_time: req.arrival_time as u64,
                burst_time: req.burst_time as u64,
                priority: req.priority,
                remaining_time: req.burst_time as u64,
                status: JobStatus::NotArrived,
                core_id: None,
                start_time: None,
                completion_time: None,
            })
            .collect();
        Ok(Self { jobs })
    }

    /// Returns the number of jobs in the registry.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Iterates over all jobs.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}

impl Index<usize> for JobRegistry {
    type Output = Job;

    fn index(&self, index: usize) -> &Self::Output {
        &self.jobs[index]
    }
}

impl IndexMut<usize> for JobRegistry {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.jobs[index]
    }
}
