//! Partitioning of the job set across cores before the run.
use serde::{Deserialize, Serialize};

use crate::job::JobRegistry;

/// Load-balancing strategy used to assign jobs to cores.
///
/// Assignment happens once before simulation start; there is no rebalancing
/// mid-run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// Assigns the i-th job (in `(arrival_time, pid)` order) to core `i % n`.
    RoundRobin,
    /// Assigns each job to the core with the smallest total burst time
    /// assigned so far, ties broken by smaller core id.
    LeastLoaded,
}

impl Strategy {
    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::LeastLoaded => "least_loaded",
        }
    }
}

/// Maps jobs to cores under the given strategy.
///
/// The registry holds jobs in `(arrival_time, pid)` order, and the per-core
/// lists preserve that order, so each core receives its jobs already sorted
/// for admission.
pub fn partition(registry: &JobRegistry, num_cores: usize, strategy: Strategy) -> Vec<Vec<usize>> {
    let mut assignment = vec![Vec::new(); num_cores];
    match strategy {
        Strategy::RoundRobin => {
            for (i, job) in registry.iter().enumerate() {
                assignment[i % num_cores].push(job.id);
            }
        }
        Strategy::LeastLoaded => {
            let mut loads = vec![0u64; num_cores];
            for job in registry.iter() {
                let core_id = (0..num_cores)
                    .min_by_key(|&core_id| (loads[core_id], core_id))
                    .unwrap();
                loads[core_id] += job.burst_time;
                assignment[core_id].push(job.id);
            }
        }
    }
    assignment
}
