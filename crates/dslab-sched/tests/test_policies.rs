use dslab_sched::config::Config;
use dslab_sched::job::JobRequest;
use dslab_sched::policy::Policy;
use dslab_sched::simulation::{CpuSimulation, SimulationResult};
use dslab_sched::workload::RandomWorkload;

fn run_single_core(policy: Policy, jobs: &[JobRequest]) -> SimulationResult {
    let mut sim = CpuSimulation::new(Config::single_core(policy));
    sim.add_jobs(jobs);
    sim.run()
}

fn completion_pids(result: &SimulationResult) -> Vec<u32> {
    result.completions.iter().map(|c| c.pid).collect()
}

#[test]
// FCFS runs jobs in arrival order to completion: P1 on 0-4, P2 on 5-7, P3 on 8-15
fn test_fcfs_single_core() {
    let jobs = vec![
        JobRequest::new(1, 0, 5, 1),
        JobRequest::new(2, 1, 3, 1),
        JobRequest::new(3, 2, 8, 1),
    ];
    let result = run_single_core(Policy::Fcfs, &jobs);
    assert!(result.status.is_ok());
    assert_eq!(completion_pids(&result), vec![1, 2, 3]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![5, 8, 16]);
    assert!((result.aggregates.avg_waiting_time - 10.0 / 3.0).abs() < 1e-9);
    assert!((result.aggregates.avg_turnaround_time - 26.0 / 3.0).abs() < 1e-9);
}

#[test]
// SJF picks the shortest arrived job once the core frees up:
// P1 on 0-6, then P3 (burst 1), then P2, then P4
fn test_sjf_non_preemptive() {
    let jobs = vec![
        JobRequest::new(1, 0, 7, 0),
        JobRequest::new(2, 2, 4, 0),
        JobRequest::new(3, 4, 1, 0),
        JobRequest::new(4, 5, 4, 0),
    ];
    let result = run_single_core(Policy::SjfNp, &jobs);
    assert_eq!(completion_pids(&result), vec![1, 3, 2, 4]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![7, 8, 12, 16]);
    assert_eq!(result.aggregates.avg_waiting_time, 4.0);
}

#[test]
// RR with quantum 4: P1 on 0-3, P2 on 4-7 (done), P3 on 8-9 (done), P1 on 10
fn test_round_robin_quantum_4() {
    let jobs = vec![
        JobRequest::new(1, 0, 5, 0),
        JobRequest::new(2, 0, 4, 0),
        JobRequest::new(3, 0, 2, 0),
    ];
    let result = run_single_core(Policy::Rr { quantum: 4 }, &jobs);
    assert_eq!(completion_pids(&result), vec![2, 3, 1]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![8, 10, 11]);
}

#[test]
// Priority scheduling is non-preemptive: P1 keeps the core although P2 with a
// higher priority arrives at tick 1; then P2 runs before P3
fn test_priority_non_preemptive() {
    let jobs = vec![
        JobRequest::new(1, 0, 4, 2),
        JobRequest::new(2, 1, 3, 1),
        JobRequest::new(3, 2, 2, 3),
    ];
    let result = run_single_core(Policy::PriorityNp, &jobs);
    assert_eq!(completion_pids(&result), vec![1, 2, 3]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![4, 7, 9]);
    assert_eq!(result.completions[1].start_time, 4);
    assert_eq!(result.completions[2].start_time, 7);
}

#[test]
// MLFQ with quanta 2 and 4: both jobs exhaust the top-level quantum, get
// demoted and finish on the second level in demotion order
fn test_mlfq_demotion() {
    let policy = Policy::Mlfq {
        quanta: vec![2, 4],
        sub_policies: vec![Policy::Rr { quantum: 2 }, Policy::Rr { quantum: 4 }],
    };
    let jobs = vec![JobRequest::new(1, 0, 5, 0), JobRequest::new(2, 1, 3, 0)];
    let result = run_single_core(policy, &jobs);
    assert_eq!(completion_pids(&result), vec![1, 2]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![7, 8]);
}

#[test]
// MLFQ level may run its own discipline: the bottom level picks demoted jobs
// by burst time instead of demotion order
fn test_mlfq_with_sjf_bottom_level() {
    let policy = Policy::Mlfq {
        quanta: vec![1, 10],
        sub_policies: vec![Policy::Rr { quantum: 1 }, Policy::SjfNp],
    };
    let jobs = vec![
        JobRequest::new(1, 0, 6, 0),
        JobRequest::new(2, 0, 3, 0),
        JobRequest::new(3, 0, 4, 0),
    ];
    let result = run_single_core(policy, &jobs);
    assert_eq!(completion_pids(&result), vec![2, 3, 1]);
    let times: Vec<_> = result.completions.iter().map(|c| c.completion_time).collect();
    assert_eq!(times, vec![5, 8, 13]);
}

#[test]
// For a single core FCFS completes jobs in non-decreasing arrival order with
// ties broken by pid
fn test_fcfs_completion_order_invariant() {
    let mut workload = RandomWorkload::new(42);
    let jobs = workload.generate(30);
    let result = run_single_core(Policy::Fcfs, &jobs);
    assert!(result.status.is_ok());
    let arrival = |pid: u32| jobs.iter().find(|j| j.pid == pid).unwrap().arrival_time;
    for pair in result.completions.windows(2) {
        let (a, b) = (arrival(pair[0].pid), arrival(pair[1].pid));
        assert!(a < b || (a == b && pair[0].pid < pair[1].pid));
    }
}

#[test]
// With simultaneous arrivals SJF completes jobs in (burst_time, pid) order
fn test_sjf_completion_order_invariant() {
    let mut workload = RandomWorkload::new(7);
    let jobs = workload.generate(25);
    let jobs: Vec<_> = jobs
        .iter()
        .map(|j| JobRequest::new(j.pid, 0, j.burst_time, j.priority))
        .collect();
    let result = run_single_core(Policy::SjfNp, &jobs);
    let burst = |pid: u32| jobs.iter().find(|j| j.pid == pid).unwrap().burst_time;
    for pair in result.completions.windows(2) {
        let (a, b) = (burst(pair[0].pid), burst(pair[1].pid));
        assert!(a < b || (a == b && pair[0].pid < pair[1].pid));
    }
}

#[test]
// With simultaneous arrivals priority scheduling completes jobs in
// (priority, pid) order
fn test_priority_completion_order_invariant() {
    let mut workload = RandomWorkload::new(99);
    let jobs = workload.generate(25);
    let jobs: Vec<_> = jobs
        .iter()
        .map(|j| JobRequest::new(j.pid, 0, j.burst_time, j.priority))
        .collect();
    let result = run_single_core(Policy::PriorityNp, &jobs);
    let priority = |pid: u32| jobs.iter().find(|j| j.pid == pid).unwrap().priority;
    for pair in result.completions.windows(2) {
        let (a, b) = (priority(pair[0].pid), priority(pair[1].pid));
        assert!(a < b || (a == b && pair[0].pid < pair[1].pid));
    }
}

#[test]
// RR with a quantum covering the longest burst never preempts, so it behaves
// exactly like FCFS
fn test_rr_with_large_quantum_matches_fcfs() {
    let mut workload = RandomWorkload::new(2023);
    let jobs = workload.generate(30);
    let fcfs = run_single_core(Policy::Fcfs, &jobs);
    let rr = run_single_core(Policy::Rr { quantum: 10 }, &jobs);
    assert_eq!(completion_pids(&fcfs), completion_pids(&rr));
    assert_eq!(fcfs.aggregates.avg_waiting_time, rr.aggregates.avg_waiting_time);
    assert_eq!(
        fcfs.aggregates.total_simulation_time,
        rr.aggregates.total_simulation_time
    );
}
