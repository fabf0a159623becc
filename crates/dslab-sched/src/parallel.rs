//! Utilities for running multiple simulations in parallel.
use std::sync::{mpsc::channel, Arc};

use itertools::izip;
use threadpool::ThreadPool;

use crate::config::Config;
use crate::job::JobRequest;
use crate::simulation::{CpuSimulation, SimulationResult};

/// Runs parallel simulations in a thread pool with `n_workers` worker threads.
///
/// Either one job set is shared by all configs or each config gets its own.
/// Results are returned in config order.
pub fn parallel_simulation_n_workers(
    mut configs: Vec<Config>,
    mut job_sets: Vec<Vec<JobRequest>>,
    n_workers: usize,
) -> Vec<SimulationResult> {
    assert!(
        job_sets.len() == 1 || job_sets.len() == configs.len(),
        "There should be one job set for each config or one job set for all configs."
    );
    let mut job_sets_arc: Vec<Arc<Vec<JobRequest>>> = Vec::with_capacity(configs.len());
    if job_sets.len() == 1 {
        let jobs = job_sets.drain(..).next().unwrap();
        let ptr = Arc::new(jobs);
        for _ in 0..configs.len() {
            job_sets_arc.push(ptr.clone());
        }
    } else {
        for jobs in job_sets.drain(..) {
            job_sets_arc.push(Arc::new(jobs));
        }
    }
    let pool = ThreadPool::new(n_workers);
    let (tx, rx) = channel();
    let len = configs.len();
    for (id, config, jobs) in izip!(0..len, configs.drain(..), job_sets_arc.drain(..)) {
        let tx = tx.clone();
        pool.execute(move || {
            let mut sim = CpuSimulation::new(config);
            sim.add_jobs(&jobs);
            tx.send((id, sim.run())).unwrap();
        });
    }
    let mut results: Vec<_> = rx.iter().take(len).collect();
    results.sort_by_key(|x| x.0);
    results.drain(..).map(|x| x.1).collect()
}

/// Runs parallel simulations in a thread pool with a separate worker for each
/// config.
pub fn parallel_simulation(
    configs: Vec<Config>,
    job_sets: Vec<Vec<JobRequest>>,
) -> Vec<SimulationResult> {
    let n_workers = configs.len();
    parallel_simulation_n_workers(configs, job_sets, n_workers)
}
