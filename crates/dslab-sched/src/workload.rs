//! Job set loading and generation.
use std::path::Path;

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::job::JobRequest;

/// Reads a job set from a CSV file with a `pid,arrival_time,burst_time,priority`
/// header.
pub fn read_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<JobRequest>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut jobs = Vec::new();
    for record in reader.deserialize() {
        jobs.push(record?);
    }
    Ok(jobs)
}

/// Suggests an RR time quantum as the mean burst time of the job set,
/// at least 1.
pub fn suggest_quantum(requests: &[JobRequest]) -> u64 {
    if requests.is_empty() {
        return 1;
    }
    let total: i64 = requests.iter().map(|r| r.burst_time.max(0)).sum();
    ((total / requests.len() as i64) as u64).max(1)
}

/// Seeded generator of random job sets.
///
/// Identical seeds produce identical job sets, so generated workloads are as
/// reproducible as hand-written ones. Pids are assigned sequentially starting
/// from 1.
///
/// # Examples
///
/// ```rust
/// use dslab_sched::workload::RandomWorkload;
///
/// let mut workload = RandomWorkload::new(123);
/// let jobs = workload.generate(5);
/// assert_eq!(jobs.len(), 5);
/// assert_eq!(jobs[0].pid, 1);
/// assert!(jobs.iter().all(|j| j.burst_time >= 1));
/// ```
pub struct RandomWorkload {
    rng: Pcg64,
    next_pid: u32,
    max_arrival: u64,
    max_burst: u64,
    max_priority: u32,
}

impl RandomWorkload {
    /// Creates a generator with the specified random seed and default ranges
    /// (arrival 0..=10, burst 1..=10, priority 1..=5).
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
            next_pid: 1,
            max_arrival: 10,
            max_burst: 10,
            max_priority: 5,
        }
    }

    /// Sets the arrival, burst and priority upper bounds (all inclusive).
    pub fn with_ranges(mut self, max_arrival: u64, max_burst: u64, max_priority: u32) -> Self {
        self.max_arrival = max_arrival;
        self.max_burst = max_burst.max(1);
        self.max_priority = max_priority.max(1);
        self
    }

    /// Generates the next batch of random jobs.
    pub fn generate(&mut self, count: usize) -> Vec<JobRequest> {
        let mut jobs = Vec::with_capacity(count);
        for _ in 0..count {
            let pid = self.next_pid;
            self.next_pid += 1;
            jobs.push(JobRequest {
                pid,
                arrival_time: self.rng.gen_range(0..=self.max_arrival) as i64,
                burst_time: self.rng.gen_range(1..=self.max_burst) as i64,
                priority: self.rng.gen_range(1..=self.max_priority) as i32,
            });
        }
        jobs
    }
}
