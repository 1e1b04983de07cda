use crate::config::Config;
use crate::history::{IndexHistory, LatestIndex, MonthKey};
use crate::portal::{AccountInfo, PaymentRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of one successful refresh cycle. Never mutated once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Account and billing summary
    pub home: AccountInfo,
    /// Month displayed by the portal (or the current UTC month)
    pub luna: MonthKey,
    /// Reconciled index per month, oldest first
    pub index_history: IndexHistory,
    pub latest_index: Option<LatestIndex>,
    /// Payment rows, newest month first
    pub plati: Vec<PaymentRow>,
    /// Months whose fetch failed or timed out and were recorded as no data
    pub degraded_months: Vec<MonthKey>,
    pub fetched_at: DateTime<Utc>,
    pub cycle_duration_ms: u64,
}

/// Coordinator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Fetching,
}

/// Cycle statistics published next to the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub state: CoordinatorState,
    pub total_cycles: u64,
    pub failed_cycles: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refresh_interval_secs: u64,
    pub history_months: usize,
}

impl CoordinatorStatus {
    pub(super) fn initial(settings: &CoordinatorSettings) -> Self {
        Self {
            state: CoordinatorState::Idle,
            total_cycles: 0,
            failed_cycles: 0,
            last_success_at: None,
            last_failure_at: None,
            last_error: None,
            refresh_interval_secs: settings.refresh_interval.as_secs(),
            history_months: settings.history_months,
        }
    }
}

/// Knobs the coordinator reads from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub refresh_interval: Duration,
    /// Trailing months to fetch; values below 1 are treated as 1
    pub history_months: usize,
    /// Bound for a single month's meter-reading fetch
    pub month_timeout: Duration,
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            refresh_interval: config.scan_interval(),
            history_months: config.history_months.max(1) as usize,
            month_timeout: Duration::from_secs(config.month_timeout_secs),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
