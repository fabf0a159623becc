//! Simulation configuration (YAML-serializable).
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatcher::Strategy;
use crate::policy::Policy;
use crate::simulation::Status;

/// Assignment of scheduling policies to cores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PolicyAssignment {
    /// One policy applied to all cores.
    Single(Policy),
    /// One policy per core, indexed by core id; the length must equal the
    /// number of cores.
    PerCore(Vec<Policy>),
}

/// Simulation config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Number of simulated cores.
    pub num_cores: usize,
    /// Load-balancing strategy used by the dispatcher.
    pub strategy: Strategy,
    /// Scheduling policies of the cores.
    pub policies: PolicyAssignment,
}

impl Config {
    /// Creates a single-core config with the given policy.
    pub fn single_core(policy: Policy) -> Self {
        Self {
            num_cores: 1,
            strategy: Strategy::RoundRobin,
            policies: PolicyAssignment::Single(policy),
        }
    }

    /// Creates a multi-core config with the same policy on every core.
    pub fn uniform(num_cores: usize, strategy: Strategy, policy: Policy) -> Self {
        Self {
            num_cores,
            strategy,
            policies: PolicyAssignment::Single(policy),
        }
    }

    /// Returns the policy of the given core.
    pub fn policy_for_core(&self, core_id: usize) -> &Policy {
        match &self.policies {
            PolicyAssignment::Single(policy) => policy,
            PolicyAssignment::PerCore(policies) => &policies[core_id],
        }
    }

    /// Checks the static constraints on the config.
    pub fn validate(&self) -> Result<(), Status> {
        if self.num_cores == 0 {
            return Err(Status::InvalidConfig {
                reason: "number of cores must be positive".to_string(),
            });
        }
        if let PolicyAssignment::PerCore(policies) = &self.policies {
            if policies.len() != self.num_cores {
                return Err(Status::InvalidConfig {
                    reason: format!(
                        "{} per-core policies for {} cores",
                        policies.len(),
                        self.num_cores
                    ),
                });
            }
        }
        for core_id in 0..self.num_cores {
            self.policy_for_core(core_id)
                .validate()
                .map_err(|reason| Status::InvalidConfig { reason })?;
        }
        Ok(())
    }

    /// Creates Config from RawConfig using the default resolvers.
    pub fn from_raw(raw: RawConfig) -> Result<Self, Status> {
        let invalid = |reason: String| Status::InvalidConfig { reason };
        let strategy = if raw.strategy.is_empty() {
            Strategy::RoundRobin
        } else {
            default_strategy_resolver(&raw.strategy).map_err(invalid)?
        };
        let policies = if !raw.policies.is_empty() {
            let mut resolved = Vec::with_capacity(raw.policies.len());
            for s in &raw.policies {
                resolved.push(default_policy_resolver(s).map_err(invalid)?);
            }
            PolicyAssignment::PerCore(resolved)
        } else if !raw.policy.is_empty() {
            PolicyAssignment::Single(default_policy_resolver(&raw.policy).map_err(invalid)?)
        } else {
            PolicyAssignment::Single(Policy::Fcfs)
        };
        Ok(Self {
            num_cores: raw.num_cores,
            strategy,
            policies,
        })
    }

    /// Creates Config from a YAML file.
    pub fn from_yaml(path: &Path) -> Result<Self, Status> {
        let f = File::open(path).map_err(|e| Status::InvalidConfig {
            reason: format!("cannot open config file: {}", e),
        })?;
        let raw: RawConfig = serde_yaml::from_reader(f).map_err(|e| Status::InvalidConfig {
            reason: format!("malformed config file: {}", e),
        })?;
        Self::from_raw(raw)
    }
}

fn default_one() -> usize {
    1
}

/// Similar to [`Config`], but policies and strategy are plain strings resolved
/// through [`default_policy_resolver`] and [`default_strategy_resolver`].
#[derive(Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Number of simulated cores.
    #[serde(default = "default_one")]
    pub num_cores: usize,
    /// Strategy name (`round_robin` or `least_loaded`).
    #[serde(default)]
    pub strategy: String,
    /// Policy string applied to all cores.
    #[serde(default)]
    pub policy: String,
    /// Per-core policy strings; takes precedence over `policy` when non-empty.
    #[serde(default)]
    pub policies: Vec<String>,
}

/// Parses map with options from string.
pub fn parse_options(s: &str) -> HashMap<String, String> {
    let mut ans = HashMap::new();
    for t in s.split(',') {
        let val = t.split_once('=');
        if let Some((l, r)) = val {
            ans.insert(l.to_string(), r.to_string());
        }
    }
    ans
}

/// Creates [`Strategy`] from a string containing its name.
pub fn default_strategy_resolver(s: &str) -> Result<Strategy, String> {
    match s.to_ascii_lowercase().as_str() {
        "round_robin" | "roundrobin" => Ok(Strategy::RoundRobin),
        "least_loaded" | "leastloaded" => Ok(Strategy::LeastLoaded),
        _ => Err(format!("unknown strategy: {}", s)),
    }
}

/// Creates [`Policy`] from a string containing its name and parameters.
///
/// Supported forms: `FCFS`, `SJF`, `Priority`, `RR[quantum=4]`,
/// `MLFQ[quanta=2:4:8,policies=RR:RR:FCFS]` (the `policies` option defaults to
/// RR on every level).
///
/// # Examples
///
/// ```rust
/// use dslab_sched::config::default_policy_resolver;
/// use dslab_sched::policy::Policy;
///
/// let policy = default_policy_resolver("RR[quantum=4]").unwrap();
/// assert_eq!(policy, Policy::Rr { quantum: 4 });
/// assert!(default_policy_resolver("LIFO").is_err());
/// ```
pub fn default_policy_resolver(s: &str) -> Result<Policy, String> {
    if s.eq_ignore_ascii_case("fcfs") {
        return Ok(Policy::Fcfs);
    }
    if s.eq_ignore_ascii_case("sjf") {
        return Ok(Policy::SjfNp);
    }
    if s.eq_ignore_ascii_case("priority") {
        return Ok(Policy::PriorityNp);
    }
    if s.len() >= 4 && s[0..3].eq_ignore_ascii_case("rr[") && s.ends_with(']') {
        let opts = parse_options(&s[3..s.len() - 1]);
        let quantum = opts
            .get("quantum")
            .ok_or_else(|| "RR requires a quantum option".to_string())?
            .parse::<u64>()
            .map_err(|e| format!("bad RR quantum: {}", e))?;
        return Ok(Policy::Rr { quantum });
    }
    if s.len() >= 6 && s[0..5].eq_ignore_ascii_case("mlfq[") && s.ends_with(']') {
        let opts = parse_options(&s[5..s.len() - 1]);
        let mut quanta = Vec::new();
        for part in opts
            .get("quanta")
            .ok_or_else(|| "MLFQ requires a quanta option".to_string())?
            .split(':')
        {
            quanta.push(
                part.parse::<u64>()
                    .map_err(|e| format!("bad MLFQ quantum {:?}: {}", part, e))?,
            );
        }
        let sub_policies = match opts.get("policies") {
            Some(names) => {
                let mut subs = Vec::new();
                for (k, name) in names.split(':').enumerate() {
                    subs.push(resolve_mlfq_sub_policy(name, quanta.get(k).copied())?);
                }
                subs
            }
            None => quanta.iter().map(|&quantum| Policy::Rr { quantum }).collect(),
        };
        return Ok(Policy::Mlfq { quanta, sub_policies });
    }
    Err(format!("unknown policy: {}", s))
}

// Sub-policy names inside MLFQ are bare (no options); RR takes its quantum
// from the corresponding level.
fn resolve_mlfq_sub_policy(name: &str, level_quantum: Option<u64>) -> Result<Policy, String> {
    if name.eq_ignore_ascii_case("rr") {
        return Ok(Policy::Rr {
            quantum: level_quantum.unwrap_or(1),
        });
    }
    if name.eq_ignore_ascii_case("mlfq") || name.to_ascii_lowercase().starts_with("mlfq[") {
        return Err("MLFQ levels cannot nest another MLFQ".to_string());
    }
    default_policy_resolver(name)
}
