//! Tool for running batch experiments across (job set, config) combinations.
use std::path::{Path, PathBuf};

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::config::{Config, RawConfig};
use crate::job::JobRequest;
use crate::metrics::Aggregates;
use crate::parallel::parallel_simulation_n_workers;
use crate::workload;

/// Contains result of a single simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    /// Name of the job set file.
    pub job_set: String,
    /// Short description of the config.
    pub config: String,
    /// Terminal status of the run.
    pub status: String,
    /// Number of completed jobs.
    pub completed: usize,
    /// Aggregate metrics of the run.
    pub aggregates: Aggregates,
}

/// YAML description of an experiment.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// CSV job set files.
    pub job_sets: Vec<PathBuf>,
    /// Simulation configs to run every job set against.
    pub configs: Vec<RawConfig>,
}

struct Run {
    job_set_name: String,
    jobs: Vec<JobRequest>,
    config_name: String,
    config: Config,
}

/// Represents an experiment consisting of multiple simulation runs,
/// where each run corresponds to a unique (job set, config) combination.
pub struct Experiment {
    runs: Vec<Run>,
}

impl Experiment {
    /// Loads experiment from a YAML config file.
    ///
    /// Panics if the experiment file, a job set or a config cannot be read.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Self {
        let config: ExperimentConfig = std::fs::read_to_string(config_path.as_ref())
            .ok()
            .and_then(|f| serde_yaml::from_str(&f).ok())
            .unwrap_or_else(|| {
                panic!(
                    "Can't read experiment config from file {}",
                    config_path.as_ref().display()
                )
            });

        let mut job_sets = Vec::with_capacity(config.job_sets.len());
        for path in &config.job_sets {
            let jobs = workload::read_jobs(path)
                .unwrap_or_else(|e| panic!("Can't read job set from file {}: {}", path.display(), e));
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            job_sets.push((name, jobs));
        }
        let mut configs = Vec::with_capacity(config.configs.len());
        for raw in &config.configs {
            let resolved = Config::from_raw(raw.clone())
                .unwrap_or_else(|status| panic!("Bad config in experiment: {}", status));
            configs.push((config_name(raw), resolved));
        }
        let runs = iproduct!(job_sets.iter(), configs.iter())
            .map(|((job_set_name, jobs), (config_name, config))| Run {
                job_set_name: job_set_name.clone(),
                jobs: jobs.clone(),
                config_name: config_name.clone(),
                config: config.clone(),
            })
            .collect();
        Self { runs }
    }

    /// Returns the number of runs in the experiment.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns whether the experiment has no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Runs all combinations on `threads` worker threads and returns the
    /// results in combination order.
    pub fn run(self, threads: usize) -> Vec<RunResult> {
        let mut configs = Vec::with_capacity(self.runs.len());
        let mut job_sets = Vec::with_capacity(self.runs.len());
        let mut names = Vec::with_capacity(self.runs.len());
        for run in self.runs {
            configs.push(run.config);
            job_sets.push(run.jobs);
            names.push((run.job_set_name, run.config_name));
        }
        let results = parallel_simulation_n_workers(configs, job_sets, threads);
        names
            .into_iter()
            .zip(results)
            .map(|((job_set, config), result)| RunResult {
                job_set,
                config,
                status: result.status.to_string(),
                completed: result.completions.len(),
                aggregates: result.aggregates,
            })
            .collect()
    }
}

fn config_name(raw: &RawConfig) -> String {
    let policy = if !raw.policies.is_empty() {
        raw.policies.join("|")
    } else if !raw.policy.is_empty() {
        raw.policy.clone()
    } else {
        "FCFS".to_string()
    };
    let strategy = if raw.strategy.is_empty() {
        "round_robin"
    } else {
        raw.strategy.as_str()
    };
    format!("{}x{},{}", raw.num_cores, strategy, policy)
}
