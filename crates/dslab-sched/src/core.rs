//! Simulated CPU core.
use std::collections::VecDeque;

use crate::event::{EventKind, SimEvent};
use crate::job::{JobRegistry, JobStatus};
use crate::logger::EventLogger;
use crate::policy::{Policy, ReadyQueue};

struct RunningJob {
    job: usize,
    // remaining quantum budget, None for non-preemptive disciplines
    quantum_left: Option<u64>,
    // MLFQ level the job was dispatched from
    level: Option<usize>,
}

/// Result of one core tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// One tick of work was executed; carries the internal id of the job that
    /// completed at the end of this tick, if any.
    Busy(Option<usize>),
    /// No arrived job was available to run.
    Idle,
}

/// A single simulated core.
///
/// The core owns the jobs assigned to it by the dispatcher: first in a pending
/// list ordered by `(arrival_time, pid)`, then in the ready structure of its
/// policy, and finally as the running job. All job state mutation during the
/// run happens in [`Core::tick`].
pub struct Core {
    id: usize,
    policy: Policy,
    pending: VecDeque<usize>,
    ready: ReadyQueue,
    running: Option<RunningJob>,
}

impl Core {
    /// Creates a core with the given policy and assigned jobs.
    ///
    /// `jobs` must be ordered by `(arrival_time, pid)`; the dispatcher
    /// preserves this order when partitioning the registry.
    ///
    /// # Panics
    ///
    /// Panics if the policy fails [`Policy::validate`]. The simulation entry
    /// point rejects such configs as `InvalidConfig` before any core is
    /// built, so this fires only when a core is constructed directly with an
    /// unvalidated policy.
    pub fn new(id: usize, policy: Policy, jobs: Vec<usize>) -> Self {
        if let Err(reason) = policy.validate() {
            panic!("invalid policy for core {}: {}", id, reason);
        }
        let ready = ReadyQueue::new(&policy);
        Self {
            id,
            policy,
            pending: jobs.into(),
            ready,
            running: None,
        }
    }

    /// Returns the core id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the scheduling policy of this core.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Returns the number of jobs owned by the core that are not finished.
    pub fn active_job_count(&self) -> usize {
        self.pending.len() + self.ready.len() + usize::from(self.running.is_some())
    }

    /// Returns whether the core has no work left.
    pub fn is_retired(&self) -> bool {
        self.pending.is_empty() && self.ready.is_empty() && self.running.is_none()
    }

    /// Advances this core by one tick.
    ///
    /// In order: admits jobs whose arrival time has been reached, re-queues a
    /// job whose quantum expired at the previous tick boundary (so same-tick
    /// arrivals precede it in the queue), selects a job if the core is free,
    /// and executes one unit of work.
    pub fn tick(
        &mut self,
        now: u64,
        registry: &mut JobRegistry,
        logger: &mut dyn EventLogger,
    ) -> TickOutcome {
        while let Some(&next) = self.pending.front() {
            if registry[next].arrival_time > now {
                break;
            }
            self.pending.pop_front();
            registry[next].status = JobStatus::Ready;
            self.ready.push(next);
            self.emit(logger, now, EventKind::Admit { pid: registry[next].pid });
        }

        let quantum_expired = matches!(&self.running, Some(run) if run.quantum_left == Some(0));
        if quantum_expired {
            let run = self.running.take().unwrap();
            registry[run.job].status = JobStatus::Ready;
            self.ready.requeue(run.job, run.level);
            self.emit(logger, now, EventKind::Preempt { pid: registry[run.job].pid });
        }

        if self.running.is_none() {
            match self.ready.take_next(registry) {
                Some(dispatch) => {
                    let job = &mut registry[dispatch.job];
                    if job.start_time.is_none() {
                        job.start_time = Some(now);
                    }
                    job.status = JobStatus::Running;
                    let pid = job.pid;
                    self.running = Some(RunningJob {
                        job: dispatch.job,
                        quantum_left: dispatch.quantum,
                        level: dispatch.level,
                    });
                    self.emit(logger, now, EventKind::Dispatch { pid });
                }
                None => {
                    self.emit(logger, now, EventKind::Idle);
                    return TickOutcome::Idle;
                }
            }
        }

        let run = self.running.as_mut().unwrap();
        let job = &mut registry[run.job];
        job.remaining_time -= 1;
        if let Some(left) = run.quantum_left.as_mut() {
            *left -= 1;
        }
        if job.remaining_time == 0 {
            job.status = JobStatus::Finished;
            job.completion_time = Some(now + 1);
            let (id, pid) = (job.id, job.pid);
            self.running = None;
            self.emit(logger, now, EventKind::Complete { pid });
            TickOutcome::Busy(Some(id))
        } else {
            TickOutcome::Busy(None)
        }
    }

    fn emit(&self, logger: &mut dyn EventLogger, now: u64, kind: EventKind) {
        logger.record(SimEvent {
            tick: now,
            core_id: self.id,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobRequest;
    use crate::logger::NullLogger;

    fn run_to_completion(core: &mut Core, registry: &mut JobRegistry) -> Vec<(u32, u64)> {
        let mut logger = NullLogger::new();
        let mut completed = Vec::new();
        let mut now = 0;
        while !core.is_retired() {
            if let TickOutcome::Busy(Some(id)) = core.tick(now, registry, &mut logger) {
                completed.push((registry[id].pid, registry[id].completion_time.unwrap()));
            }
            now += 1;
            assert!(now < 10_000, "core made no progress");
        }
        completed
    }

    #[test]
    fn rr_requeues_preempted_job_after_same_tick_arrival() {
        // P1 exhausts its quantum at tick 2, exactly when P2 arrives;
        // P2 must enter the queue first and run next.
        let mut registry = JobRegistry::from_requests(&[
            JobRequest::new(1, 0, 4, 0),
            JobRequest::new(2, 2, 2, 0),
        ])
        .unwrap();
        let jobs: Vec<_> = (0..registry.len()).collect();
        let mut core = Core::new(0, Policy::Rr { quantum: 2 }, jobs);
        let completed = run_to_completion(&mut core, &mut registry);
        assert_eq!(completed, vec![(2, 4), (1, 6)]);
    }

    #[test]
    fn non_preemptive_policy_runs_to_completion() {
        let mut registry = JobRegistry::from_requests(&[
            JobRequest::new(1, 0, 5, 0),
            JobRequest::new(2, 1, 1, 0),
        ])
        .unwrap();
        let jobs: Vec<_> = (0..registry.len()).collect();
        let mut core = Core::new(0, Policy::Fcfs, jobs);
        let completed = run_to_completion(&mut core, &mut registry);
        assert_eq!(completed, vec![(1, 5), (2, 6)]);
        assert_eq!(registry[0].start_time, Some(0));
        assert_eq!(registry[1].start_time, Some(5));
    }

    #[test]
    #[should_panic(expected = "invalid policy for core 0")]
    fn rejects_unvalidated_policy() {
        let nested = Policy::Mlfq {
            quanta: vec![2],
            sub_policies: vec![Policy::Mlfq {
                quanta: vec![2],
                sub_policies: vec![Policy::Fcfs],
            }],
        };
        Core::new(0, nested, Vec::new());
    }

    #[test]
    fn idle_core_waits_for_future_arrival() {
        let mut registry = JobRegistry::from_requests(&[JobRequest::new(1, 3, 2, 0)]).unwrap();
        let mut core = Core::new(0, Policy::Fcfs, vec![0]);
        let mut logger = NullLogger::new();
        assert_eq!(core.tick(0, &mut registry, &mut logger), TickOutcome::Idle);
        assert!(!core.is_retired());
        assert_eq!(core.tick(1, &mut registry, &mut logger), TickOutcome::Idle);
        assert_eq!(core.tick(2, &mut registry, &mut logger), TickOutcome::Idle);
        assert_eq!(core.tick(3, &mut registry, &mut logger), TickOutcome::Busy(None));
        assert_eq!(core.tick(4, &mut registry, &mut logger), TickOutcome::Busy(Some(0)));
        assert!(core.is_retired());
        assert_eq!(registry[0].completion_time, Some(5));
    }
}
