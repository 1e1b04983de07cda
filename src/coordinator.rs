//! Refresh cycle orchestration
//!
//! One cycle fetches the account summary, fans out one meter-reading fetch per
//! month of the history window, reconciles the months, fetches payments and
//! publishes an immutable [`Snapshot`]. Only the per-month fetches are
//! isolated: a failure there degrades that month to "no rows". Any other
//! failure aborts the cycle and leaves the previous snapshot in place.

mod types;

pub use types::{CoordinatorSettings, CoordinatorState, CoordinatorStatus, Snapshot};

use crate::error::{EblocError, Result};
use crate::history::{MonthKey, reconcile_history, trailing_months};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::portal::{ALL_UNITS, MeterRow, PortalClient};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval, timeout};
use uuid::Uuid;

/// Drives refresh cycles and publishes their results
pub struct UpdateCoordinator {
    client: PortalClient,
    settings: CoordinatorSettings,
    logger: StructuredLogger,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    status_tx: watch::Sender<CoordinatorStatus>,
}

impl UpdateCoordinator {
    pub fn new(client: PortalClient, settings: CoordinatorSettings) -> Self {
        let mut context = LogContext::new("coordinator");
        if let Some(id) = client.session().account_id() {
            context = context.with_account_id(id.to_string());
        }
        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(CoordinatorStatus::initial(&settings));
        Self {
            client,
            settings,
            logger: get_logger_with_context(context),
            snapshot_tx,
            status_tx,
        }
    }

    /// Last successfully published snapshot
    pub fn last_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.status_tx.borrow().clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.status_tx.borrow().state
    }

    pub fn refresh_interval(&self) -> Duration {
        self.settings.refresh_interval
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Run one refresh cycle and publish its snapshot.
    ///
    /// On failure the previous snapshot is kept and the error is returned as
    /// [`EblocError::UpdateFailed`] wrapping the cause.
    pub async fn refresh(&mut self) -> Result<Arc<Snapshot>> {
        let cycle_id = Uuid::new_v4().to_string();
        let logger =
            get_logger_with_context(self.logger.context().clone().with_cycle_id(cycle_id));
        self.status_tx
            .send_modify(|s| s.state = CoordinatorState::Fetching);
        let _idle_on_drop = IdleOnDrop(&self.status_tx);

        let started = Instant::now();
        let outcome = self.run_cycle(&logger, started).await;
        let now = Utc::now();

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot_tx.send_replace(Some(snapshot.clone()));
                self.status_tx.send_modify(|s| {
                    s.state = CoordinatorState::Idle;
                    s.total_cycles = s.total_cycles.saturating_add(1);
                    s.last_success_at = Some(now);
                    s.last_error = None;
                });
                logger.info(&format!(
                    "Refresh completed in {} ms: luna={}, months={}, degraded={}, payments={}",
                    snapshot.cycle_duration_ms,
                    snapshot.luna,
                    snapshot.index_history.len(),
                    snapshot.degraded_months.len(),
                    snapshot.plati.len()
                ));
                Ok(snapshot)
            }
            Err(cause) => {
                let err = EblocError::update_failed(cause);
                let message = err.to_string();
                self.status_tx.send_modify(|s| {
                    s.state = CoordinatorState::Idle;
                    s.total_cycles = s.total_cycles.saturating_add(1);
                    s.failed_cycles = s.failed_cycles.saturating_add(1);
                    s.last_failure_at = Some(now);
                    s.last_error = Some(message.clone());
                });
                logger.error(&message);
                Err(err)
            }
        }
    }

    async fn run_cycle(&self, logger: &StructuredLogger, started: Instant) -> Result<Snapshot> {
        logger.debug("Starting refresh cycle");
        let home = self.client.get_account_info().await?;
        let luna = home.displayed_month()?.unwrap_or_else(|| {
            logger.debug("Account info has no displayed month; using current UTC month");
            MonthKey::current_utc()
        });

        let months = trailing_months(luna, self.settings.history_months);
        let (rows, degraded_months) = self.fetch_months(&months, logger).await;
        let (index_history, latest_index) = reconcile_history(&rows);

        let plati = self
            .client
            .get_payment_history(self.settings.history_months)
            .await?;

        Ok(Snapshot {
            home,
            luna,
            index_history,
            latest_index,
            plati,
            degraded_months,
            fetched_at: Utc::now(),
            cycle_duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Concurrent per-month fetch. Every month gets an entry; failed months
    /// keep an empty row set and are reported back as degraded.
    async fn fetch_months(
        &self,
        months: &[MonthKey],
        logger: &StructuredLogger,
    ) -> (BTreeMap<MonthKey, Vec<MeterRow>>, Vec<MonthKey>) {
        let limit = self.settings.month_timeout;
        let mut tasks = JoinSet::new();
        let mut task_months = HashMap::new();

        for &month in months {
            let client = self.client.clone();
            let handle = tasks.spawn(async move {
                match timeout(limit, client.get_meter_readings(&month, ALL_UNITS)).await {
                    Ok(result) => result,
                    Err(_) => Err(EblocError::timeout(format!(
                        "meter readings for {} took longer than {:?}",
                        month, limit
                    ))),
                }
            });
            task_months.insert(handle.id(), month);
        }

        let mut by_month: BTreeMap<MonthKey, Vec<MeterRow>> =
            months.iter().map(|m| (*m, Vec::new())).collect();
        let mut degraded = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_err) => (
                    join_err.id(),
                    Err(EblocError::io(format!("meter task aborted: {}", join_err))),
                ),
            };
            let Some(month) = task_months.get(&id).copied() else {
                continue;
            };
            match outcome {
                Ok(rows) => {
                    logger.trace(&format!("{}: {} meter rows", month, rows.len()));
                    by_month.insert(month, rows);
                }
                Err(e) => {
                    let month_logger = get_logger_with_context(
                        logger.context().clone().with_field("month", month.to_string()),
                    );
                    month_logger.warn(&format!("Month degraded to no data: {}", e));
                    degraded.push(month);
                }
            }
        }

        degraded.sort();
        (by_month, degraded)
    }

    /// Refresh now, then every `refresh_interval` until `shutdown` resolves.
    ///
    /// A cycle still running at shutdown is dropped, which aborts its
    /// outstanding month fetches.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = interval(self.settings.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.logger.info(&format!(
            "Coordinator started: interval={}s, history_months={}",
            self.settings.refresh_interval.as_secs(),
            self.settings.history_months
        ));

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    // Failures are already logged and counted by refresh()
                    let interrupted = tokio::select! {
                        biased;
                        _ = &mut shutdown => true,
                        _ = self.refresh() => false,
                    };
                    if interrupted {
                        self.logger.info("Shutdown requested during refresh; cycle abandoned");
                        break;
                    }
                }
            }
        }

        self.status_tx
            .send_modify(|s| s.state = CoordinatorState::Idle);
        self.logger.info("Coordinator stopped");
    }
}

/// Puts the status back to `Idle` if a cycle is dropped mid-flight
struct IdleOnDrop<'a>(&'a watch::Sender<CoordinatorStatus>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|s| {
            let fetching = s.state == CoordinatorState::Fetching;
            if fetching {
                s.state = CoordinatorState::Idle;
            }
            fetching
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn settings_from_config() {
        let mut config = Config::default();
        config.scan_interval_min = 30;
        config.history_months = 6;
        config.month_timeout_secs = 10;
        let s = CoordinatorSettings::from_config(&config);
        assert_eq!(s.refresh_interval, Duration::from_secs(1800));
        assert_eq!(s.history_months, 6);
        assert_eq!(s.month_timeout, Duration::from_secs(10));
    }

    #[test]
    fn initial_status_is_idle() {
        let s = CoordinatorSettings::default();
        let status = CoordinatorStatus::initial(&s);
        assert_eq!(status.state, CoordinatorState::Idle);
        assert_eq!(status.total_cycles, 0);
        assert_eq!(status.refresh_interval_secs, 3600);
        assert_eq!(status.history_months, 12);
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(CoordinatorState::Fetching).unwrap(),
            serde_json::json!("fetching")
        );
    }
}
