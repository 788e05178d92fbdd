//! Scheduler-facing jobs
//!
//! The engine does not decide *when*; an external scheduler (cron or
//! equivalent) invokes these entry points at the calendar boundaries it
//! owns.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    clock::Clock,
    error::AppResult,
    services::{reconciliation::ReconciliationService, visits::VisitLedgerService},
};

/// Outcome of the daily rollover run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DailyRolloverReport {
    pub closed_visits: usize,
    pub reconciled_visitors: usize,
}

#[derive(Clone)]
pub struct SchedulerJobs {
    visits: VisitLedgerService,
    reconciliation: ReconciliationService,
    clock: Arc<dyn Clock>,
}

impl SchedulerJobs {
    pub fn new(
        visits: VisitLedgerService,
        reconciliation: ReconciliationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            visits,
            reconciliation,
            clock,
        }
    }

    /// Run once per operational day after local midnight: close yesterday's
    /// open visits, then sweep every active visitor so past no-shows stop
    /// consuming quota.
    pub async fn run_daily_rollover(&self) -> AppResult<DailyRolloverReport> {
        let today = self.clock.today();
        let yesterday = today
            .pred_opt()
            .expect("operational date has a previous day");

        let closed_visits = self.visits.auto_sign_out_stale_visits(yesterday).await?;
        let reconciled_visitors = self.reconciliation.reconcile_all_active().await?;

        tracing::info!(closed_visits, reconciled_visitors, "daily rollover complete");
        Ok(DailyRolloverReport {
            closed_visits,
            reconciled_visitors,
        })
    }

    /// Monthly boundary: lift quota suspensions. Manually suspended
    /// visitors stay suspended.
    pub async fn run_monthly_reset(&self) -> AppResult<usize> {
        let reactivated = self.reconciliation.reset_quota_suspensions().await?;
        tracing::info!(reactivated, "monthly quota reset complete");
        Ok(reactivated)
    }

    /// Yearly boundary: same reactivation rule as the monthly job
    pub async fn run_yearly_reset(&self) -> AppResult<usize> {
        let reactivated = self.reconciliation.reset_quota_suspensions().await?;
        tracing::info!(reactivated, "yearly quota reset complete");
        Ok(reactivated)
    }
}
