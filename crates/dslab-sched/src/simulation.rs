//! Simulation configuration and execution.
use std::cell::{Cell, RefCell};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::core::{Core, TickOutcome};
use crate::dispatcher;
use crate::job::{Job, JobRegistry, JobRequest, JobStatus};
use crate::log_info;
use crate::logger::{EventLogger, NullLogger};
use crate::metrics::{self, Aggregates, CoreStats};

/// Monotonic tick counter shared by all cores.
///
/// Only the simulator advances it, between full rounds over the cores.
#[derive(Default)]
pub struct Clock {
    now: u64,
}

impl Clock {
    /// Returns the current tick.
    pub fn now(&self) -> u64 {
        self.now
    }

    fn advance(&mut self) {
        self.now += 1;
    }
}

/// Cloneable cancellation handle.
///
/// Setting the flag makes the simulator stop at the next tick boundary and
/// return the completions observed so far. The simulator is single-threaded,
/// so the flag is typically raised from an [`EventLogger`] callback.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    /// Requests cancellation of the run.
    pub fn cancel(&self) {
        self.flag.set(true);
    }

    /// Returns whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.flag.get()
    }
}

/// Terminal status of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Status {
    /// All submitted jobs completed.
    Ok,
    /// The config failed static validation; nothing was simulated.
    InvalidConfig {
        /// What is wrong with the config.
        reason: String,
    },
    /// An input job failed static validation; nothing was simulated.
    InvalidJob {
        /// External id of the offending job.
        pid: u32,
        /// What is wrong with the job.
        reason: String,
    },
    /// No core made progress and no future arrivals remained. Signals a
    /// scheduling bug; the result carries the completions observed so far.
    InfiniteIdle {
        /// Tick at which the guard fired.
        time: u64,
    },
    /// Cancellation was observed at a tick boundary; the result carries the
    /// completions observed so far.
    Canceled {
        /// Tick at which the run stopped.
        at: u64,
    },
}

impl Status {
    /// Returns whether the run completed normally.
    pub fn is_ok(&self) -> bool {
        *self == Status::Ok
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::InvalidConfig { reason } => write!(f, "invalid config: {}", reason),
            Status::InvalidJob { pid, reason } => write!(f, "invalid job {}: {}", pid, reason),
            Status::InfiniteIdle { time } => write!(f, "infinite idle at tick {}", time),
            Status::Canceled { at } => write!(f, "canceled at tick {}", at),
        }
    }
}

/// Per-job record of a finished job, in completion order.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Completion {
    /// External job identifier.
    pub pid: u32,
    /// Core the job ran on.
    pub core_id: usize,
    /// Tick at which the job first received the CPU.
    pub start_time: u64,
    /// Tick at which the job finished.
    pub completion_time: u64,
    /// Ticks the job spent ready but not running.
    pub waiting_time: u64,
    /// Completion minus arrival.
    pub turnaround_time: u64,
}

/// Everything a run produces: completions, aggregates and the terminal status.
#[derive(Clone, Serialize)]
pub struct SimulationResult {
    /// Completed jobs in `(tick, core_id)` completion order.
    pub completions: Vec<Completion>,
    /// Aggregate metrics over the completed set.
    pub aggregates: Aggregates,
    /// Per-core breakdown of the completed set.
    pub core_stats: Vec<CoreStats>,
    /// Terminal status of the run.
    pub status: Status,
}

impl SimulationResult {
    fn empty(status: Status) -> Self {
        Self {
            completions: Vec::new(),
            aggregates: Aggregates::default(),
            core_stats: Vec::new(),
            status,
        }
    }
}

/// Represents a simulation, provides methods for its configuration and execution.
///
/// The simulator owns the cores and drives the shared clock: on every tick it
/// invokes the cores in ascending id order, collects completions, then
/// advances the clock. This ordering is part of the contract and makes runs
/// reproducible.
pub struct CpuSimulation {
    config: Config,
    requests: Vec<JobRequest>,
    logger: Rc<RefCell<dyn EventLogger>>,
    cancel: CancelToken,
}

impl CpuSimulation {
    /// Creates a new simulation with the specified config.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            requests: Vec::new(),
            logger: Rc::new(RefCell::new(NullLogger::new())),
            cancel: CancelToken::default(),
        }
    }

    /// Submits one job.
    pub fn add_job(&mut self, request: JobRequest) {
        self.requests.push(request);
    }

    /// Submits a batch of jobs.
    pub fn add_jobs(&mut self, requests: &[JobRequest]) {
        self.requests.extend_from_slice(requests);
    }

    /// Subscribes a logger to the event stream. Keep a clone of the `Rc` to
    /// inspect buffered events after the run.
    pub fn set_logger(&mut self, logger: Rc<RefCell<dyn EventLogger>>) {
        self.logger = logger;
    }

    /// Returns a handle that cancels this run when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the simulation to completion and returns the result bundle.
    ///
    /// Static validation failures (config, then jobs) are reported in the
    /// result status without simulating anything; an empty job set yields an
    /// empty `Ok` result.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dslab_sched::config::Config;
    /// use dslab_sched::job::JobRequest;
    /// use dslab_sched::policy::Policy;
    /// use dslab_sched::simulation::CpuSimulation;
    ///
    /// let mut sim = CpuSimulation::new(Config::single_core(Policy::Fcfs));
    /// sim.add_job(JobRequest::new(1, 0, 3, 0));
    /// sim.add_job(JobRequest::new(2, 1, 2, 0));
    /// let result = sim.run();
    /// assert!(result.status.is_ok());
    /// assert_eq!(result.completions[0].completion_time, 3);
    /// assert_eq!(result.completions[1].completion_time, 5);
    /// ```
    pub fn run(self) -> SimulationResult {
        if let Err(status) = self.config.validate() {
            return SimulationResult::empty(status);
        }
        let mut registry = match JobRegistry::from_requests(&self.requests) {
            Ok(registry) => registry,
            Err(status) => return SimulationResult::empty(status),
        };
        if registry.is_empty() {
            return SimulationResult::empty(Status::Ok);
        }

        let assignment = dispatcher::partition(&registry, self.config.num_cores, self.config.strategy);
        let mut cores = Vec::with_capacity(self.config.num_cores);
        for (core_id, jobs) in assignment.into_iter().enumerate() {
            for &job in &jobs {
                registry[job].core_id = Some(core_id);
            }
            cores.push(Core::new(
                core_id,
                self.config.policy_for_core(core_id).clone(),
                jobs,
            ));
        }
        log_info!(
            0,
            "simulation",
            "started: {}",
            json!({
                "jobs": registry.len(),
                "cores": self.config.num_cores,
                "strategy": self.config.strategy.name(),
                "policies": cores.iter().map(|c| c.policy().name()).collect::<Vec<_>>(),
            })
        );

        let total = registry.len();
        let mut clock = Clock::default();
        let mut completed: Vec<Job> = Vec::with_capacity(total);
        let mut completions = Vec::with_capacity(total);
        let mut logger = self.logger.borrow_mut();
        let mut status = Status::Ok;
        while completed.len() < total {
            if self.cancel.is_canceled() {
                status = Status::Canceled { at: clock.now() };
                break;
            }
            let mut progress = false;
            for core in cores.iter_mut() {
                if core.is_retired() {
                    continue;
                }
                if let TickOutcome::Busy(done) = core.tick(clock.now(), &mut registry, &mut *logger)
                {
                    progress = true;
                    if let Some(id) = done {
                        let job = registry[id];
                        completed.push(job);
                        completions.push(Completion {
                            pid: job.pid,
                            core_id: core.id(),
                            start_time: job.start_time.unwrap(),
                            completion_time: job.completion_time.unwrap(),
                            waiting_time: job.waiting_time(),
                            turnaround_time: job.turnaround_time(),
                        });
                    }
                }
            }
            if !progress && completed.len() < total {
                let future_arrivals = registry.iter().any(|job| job.status == JobStatus::NotArrived);
                if !future_arrivals {
                    status = Status::InfiniteIdle { time: clock.now() };
                    break;
                }
            }
            clock.advance();
        }
        drop(logger);

        let aggregates = Aggregates::compute(&completed, self.config.num_cores);
        let core_stats = metrics::per_core_stats(&completed, self.config.num_cores);
        log_info!(
            clock.now(),
            "simulation",
            "finished: {}",
            json!({"status": status.to_string(), "completed": completed.len()})
        );
        SimulationResult {
            completions,
            aggregates,
            core_stats,
            status,
        }
    }
}
