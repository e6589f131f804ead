use crate::domain::constants::FACTOR_DISABLED_SUFFIX;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleMode {
    Disable,
    Restore,
}

/// Fully resolved inputs for one toggle invocation. Built once by the CLI
/// layer (explicit flags win over ambient env defaults) and passed by
/// reference through every operation; nothing downstream re-reads the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    pub account: String,
    pub address: String,
    pub factor_file: PathBuf,
    pub fragment_path: PathBuf,
    pub activity_log: PathBuf,
    pub window_secs: u64,
    pub mode: ToggleMode,
}

impl OverrideRequest {
    /// Path the factor-state file is parked at while the override is active.
    pub fn factor_disabled_path(&self) -> PathBuf {
        let mut os = self.factor_file.clone().into_os_string();
        os.push(FACTOR_DISABLED_SUFFIX);
        PathBuf::from(os)
    }
}

/// Derived from the two on-disk observables, never stored separately.
/// `Inconsistent` (exactly one artifact present) must never be left standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Enabled,
    Disabled,
    Inconsistent,
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleState::Enabled => write!(f, "enabled"),
            ToggleState::Disabled => write!(f, "disabled"),
            ToggleState::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

/// Typed handle for the externally scheduled restore job. The scheduler owns
/// the job; this is just enough to cancel it later.
#[derive(Debug, Clone, Serialize)]
pub struct FailsafeJob {
    pub id: u32,
    pub fire_at: String,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogOutcome {
    Connected,
    TimedOut,
    Aborted,
}

#[derive(Serialize)]
pub struct ResolvedPlan {
    pub account: String,
    pub address: String,
    pub factor_file: PathBuf,
    pub fragment_path: PathBuf,
    pub activity_log: PathBuf,
    pub window_secs: u64,
    pub failsafe_delay_minutes: u64,
    pub restore_command: String,
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the best-effort restore saga. Steps are reported in execution
/// order and never short-circuit each other.
#[derive(Debug, Serialize)]
pub struct RestoreReport {
    pub steps: Vec<StepReport>,
    pub confirmed_enabled: bool,
}

impl RestoreReport {
    pub fn fully_restored(&self) -> bool {
        self.confirmed_enabled && self.steps.iter().all(|s| s.error.is_none())
    }

    pub fn failed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.error.is_some())
            .map(|s| s.step.as_str())
            .collect()
    }
}

#[derive(Serialize)]
pub struct DisableReport {
    pub account: String,
    pub outcome: WatchdogOutcome,
    pub failsafe_job: u32,
    pub failsafe_cancelled: bool,
    pub restore: RestoreReport,
}

#[derive(Serialize)]
pub struct StatusReport {
    pub account: String,
    pub state: ToggleState,
    pub factor_override_present: bool,
    pub policy_fragment_present: bool,
}
