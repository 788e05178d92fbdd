//! Reconciliation engine
//!
//! Recomputes visit and visitor statuses after any state-changing event:
//! a new registration, a cancellation, a visitor status change, or the
//! daily rollover. The walk is deterministic: visits ordered by date then
//! creation time, monthly/yearly counters accumulated along the way, host
//! daily batches resolved FIFO afterwards.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::{
    clock::Clock,
    error::AppResult,
    models::{
        enums::{SuspensionReason, VisitStatus, VisitorCategory, VisitorStatus},
        visit::Visit,
        visitor::Visitor,
    },
    policy::{QuotaPolicies, QuotaPolicy},
    repository::AccessRepository,
    services::notifications::{notify, NotificationDispatcher},
};

/// Quota consumption for the current month and year, as of "today"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaUsage {
    pub month_used: u32,
    pub year_used: u32,
}

/// Outcome of the per-visitor counting walk
struct VisitorPass {
    /// Desired status per visit, same order as the input slice. Past visits
    /// keep their stored status; they are history, not decisions.
    desired: Vec<VisitStatus>,
    usage: QuotaUsage,
}

#[derive(Clone)]
pub struct ReconciliationService {
    repository: Arc<dyn AccessRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    policies: QuotaPolicies,
    clock: Arc<dyn Clock>,
}

impl ReconciliationService {
    pub fn new(
        repository: Arc<dyn AccessRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        policies: QuotaPolicies,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            policies,
            clock,
        }
    }

    pub fn policies(&self) -> &QuotaPolicies {
        &self.policies
    }

    /// Full reconciliation pass for one visitor: visitor-level quota walk,
    /// host daily batches for any touched (host, date) pair, then the
    /// auto-suspension evaluation.
    pub async fn reconcile_visitor(&self, visitor_id: i64) -> AppResult<()> {
        let visitor = self.repository.get_visitor(visitor_id).await?;
        let policy = self.policies.for_category(visitor.category);
        let today = self.clock.today();

        let visits = self.repository.find_visits_by_visitor(visitor_id).await?;
        let pass = visitor_pass(&policy, &visits, today);

        // Persist visitor-level outcomes. Host-linked visits under a capped
        // host limit are left to the batch pass, which ANDs both checks.
        let mut touched_batches: BTreeSet<(i64, NaiveDate)> = BTreeSet::new();
        for (visit, desired) in visits.iter().zip(pass.desired.iter()) {
            match visit.host_id {
                Some(host_id) if policy.host_daily.is_capped() => {
                    touched_batches.insert((host_id, visit.visit_date));
                }
                _ => {
                    self.apply_visit_status(&visitor, visit, *desired).await?;
                }
            }
        }

        for (host_id, date) in touched_batches {
            self.recompute_host_batch(host_id, date).await?;
        }

        self.evaluate_suspension(&visitor, &policy, pass.usage).await?;
        Ok(())
    }

    /// FIFO resolution of a (host, date) batch: the first `host_daily`
    /// visits by creation time keep their visitor-level outcome, the rest
    /// are forced unapproved. Emits one host-limit-exceeded event when the
    /// batch's unapproved count grew.
    pub async fn recompute_host_batch(&self, host_id: i64, date: NaiveDate) -> AppResult<()> {
        // Host linkage exists only in the day-guest category
        let host_daily = self
            .policies
            .for_category(VisitorCategory::DayGuest)
            .host_daily;
        if !host_daily.is_capped() {
            return Ok(());
        }

        let batch = self
            .repository
            .find_visits_by_host_and_date(host_id, date)
            .await?;
        let today = self.clock.today();

        let before_unapproved = batch
            .iter()
            .filter(|v| v.status == VisitStatus::Unapproved)
            .count() as u32;

        // Visitor-level outcomes, one walk per distinct visitor in the batch
        let mut visitors: HashMap<i64, Visitor> = HashMap::new();
        let mut visitor_outcomes: HashMap<i64, VisitStatus> = HashMap::new();
        let mut visitor_usages: HashMap<i64, QuotaUsage> = HashMap::new();
        for visit in &batch {
            if visitors.contains_key(&visit.visitor_id) {
                continue;
            }
            let visitor = self.repository.get_visitor(visit.visitor_id).await?;
            let policy = self.policies.for_category(visitor.category);
            let visits = self.repository.find_visits_by_visitor(visitor.id).await?;
            let pass = visitor_pass(&policy, &visits, today);
            for (v, desired) in visits.iter().zip(pass.desired.iter()) {
                visitor_outcomes.insert(v.id, *desired);
            }
            visitor_usages.insert(visitor.id, pass.usage);
            visitors.insert(visitor.id, visitor);
        }

        let mut after_unapproved = 0u32;
        let mut changed_visitors: BTreeSet<i64> = BTreeSet::new();
        for (position, visit) in batch.iter().enumerate() {
            let desired = if host_daily.allows(position as u32) {
                visitor_outcomes
                    .get(&visit.id)
                    .copied()
                    .unwrap_or(visit.status)
            } else {
                VisitStatus::Unapproved
            };
            if desired == VisitStatus::Unapproved {
                after_unapproved += 1;
            }
            if let Some(visitor) = visitors.get(&visit.visitor_id) {
                if visit.status != desired {
                    changed_visitors.insert(visit.visitor_id);
                }
                self.apply_visit_status(visitor, visit, desired).await?;
            }
        }

        // A changed outcome can land a visitor on their cap (a promotion
        // after a month rollover, for instance); settle their suspension
        // state now instead of waiting for the next sweep.
        for visitor_id in changed_visitors {
            if let (Some(visitor), Some(usage)) =
                (visitors.get(&visitor_id), visitor_usages.get(&visitor_id))
            {
                let policy = self.policies.for_category(visitor.category);
                self.evaluate_suspension(visitor, &policy, *usage).await?;
            }
        }

        if after_unapproved > before_unapproved {
            tracing::debug!(host_id, %date, after_unapproved, "host daily limit exceeded");
            notify!(self
                .dispatcher
                .on_host_limit_exceeded(host_id, date, after_unapproved));
        }
        Ok(())
    }

    /// Visitor-level status a visit would get if registered now for the
    /// given slot; the ledger stores this as the provisional status before
    /// committing. Host capacity is resolved afterwards by the batch pass,
    /// which is where an over-capacity downgrade and its events belong.
    pub async fn provisional_status(
        &self,
        visitor: &Visitor,
        date: NaiveDate,
    ) -> AppResult<VisitStatus> {
        let policy = self.policies.for_category(visitor.category);
        let today = self.clock.today();

        let mut visits = self.repository.find_visits_by_visitor(visitor.id).await?;
        let phantom = Visit {
            id: 0,
            visitor_id: visitor.id,
            host_id: None,
            visit_date: date,
            status: VisitStatus::Unapproved,
            sign_in_time: None,
            sign_out_time: None,
            courtesy: false,
            created_at: self.clock.now(),
        };
        visits.push(phantom);
        visits.sort_by(|a, b| {
            a.visit_date
                .cmp(&b.visit_date)
                .then(a.created_at.cmp(&b.created_at))
        });

        let pass = visitor_pass(&policy, &visits, today);
        let status = visits
            .iter()
            .zip(pass.desired.iter())
            .find(|(v, _)| v.id == 0)
            .map(|(_, s)| *s)
            .unwrap_or(VisitStatus::Unapproved);
        Ok(status)
    }

    /// Engine-level visitor status update: records a manual suspension
    /// reason, emits the status-change event, then reconciles.
    pub async fn change_visitor_status(
        &self,
        visitor_id: i64,
        new_status: VisitorStatus,
    ) -> AppResult<VisitorStatus> {
        let visitor = self.repository.get_visitor(visitor_id).await?;
        let old = visitor.status;
        if old == new_status {
            return Ok(old);
        }

        let reason = match new_status {
            VisitorStatus::Suspended | VisitorStatus::Banned => Some(SuspensionReason::Manual),
            VisitorStatus::Active => None,
        };
        self.repository
            .update_visitor_status(visitor_id, new_status, reason)
            .await?;
        tracing::info!(visitor_id, old = %old, new = %new_status, "visitor status updated");
        notify!(self
            .dispatcher
            .on_visitor_status_changed(&visitor, old, new_status));

        self.reconcile_visitor(visitor_id).await?;
        Ok(old)
    }

    /// Reconciliation sweep over every active visitor
    pub async fn reconcile_all_active(&self) -> AppResult<usize> {
        let visitors = self
            .repository
            .list_visitors_by_status(VisitorStatus::Active)
            .await?;
        let count = visitors.len();
        for visitor in visitors {
            self.reconcile_visitor(visitor.id).await?;
        }
        Ok(count)
    }

    /// Reactivate visitors whose suspension was earned by quota, leaving
    /// manual suspensions in place. Shared by the monthly and yearly reset
    /// jobs.
    pub async fn reset_quota_suspensions(&self) -> AppResult<usize> {
        let suspended = self
            .repository
            .list_visitors_by_status(VisitorStatus::Suspended)
            .await?;
        let mut reactivated = 0;
        for visitor in suspended {
            if !visitor.is_quota_suspended() {
                continue;
            }
            self.repository
                .update_visitor_status(visitor.id, VisitorStatus::Active, None)
                .await?;
            tracing::info!(visitor_id = visitor.id, "quota suspension lifted");
            notify!(self.dispatcher.on_visitor_status_changed(
                &visitor,
                VisitorStatus::Suspended,
                VisitorStatus::Active
            ));
            self.reconcile_visitor(visitor.id).await?;
            reactivated += 1;
        }
        Ok(reactivated)
    }

    /// Persist a status change if the desired value differs, emitting the
    /// visit-status-change event on a real change only
    async fn apply_visit_status(
        &self,
        visitor: &Visitor,
        visit: &Visit,
        desired: VisitStatus,
    ) -> AppResult<()> {
        if visit.status == desired {
            return Ok(());
        }
        let mut updated = visit.clone();
        updated.status = desired;
        self.repository.update_visit(&updated).await?;
        tracing::debug!(
            visit_id = visit.id,
            visitor_id = visitor.id,
            old = %visit.status,
            new = %desired,
            "visit status reconciled"
        );
        notify!(self
            .dispatcher
            .on_visit_status_changed(visitor, &updated, visit.status, desired));
        Ok(())
    }

    /// Auto-suspend an active visitor whose current month or year is fully
    /// consumed. Never touches manually suspended or banned visitors, and
    /// never reactivates anyone.
    async fn evaluate_suspension(
        &self,
        visitor: &Visitor,
        policy: &QuotaPolicy,
        usage: QuotaUsage,
    ) -> AppResult<()> {
        if !policy.monthly.reached(usage.month_used) && !policy.yearly.reached(usage.year_used) {
            return Ok(());
        }
        // The caller's snapshot may predate a batch pass inside the same
        // call, so the status gate reads the stored row
        let current = self.repository.get_visitor(visitor.id).await?;
        if current.status != VisitorStatus::Active {
            return Ok(());
        }
        self.repository
            .update_visitor_status(current.id, VisitorStatus::Suspended, Some(SuspensionReason::Quota))
            .await?;
        tracing::info!(
            visitor_id = current.id,
            month_used = usage.month_used,
            year_used = usage.year_used,
            "visitor auto-suspended on quota"
        );
        notify!(self.dispatcher.on_visitor_status_changed(
            &current,
            VisitorStatus::Active,
            VisitorStatus::Suspended
        ));
        Ok(())
    }
}

/// The counting walk. Visits must be ordered by visit_date then created_at.
/// A visit consumes quota iff it is upcoming and tentatively approved, or
/// past and attended; past no-shows drop out retroactively.
fn visitor_pass(policy: &QuotaPolicy, visits: &[Visit], today: NaiveDate) -> VisitorPass {
    let mut monthly: HashMap<(i32, u32), u32> = HashMap::new();
    let mut yearly: HashMap<i32, u32> = HashMap::new();

    let desired = visits
        .iter()
        .map(|visit| {
            let month_key = (visit.visit_date.year(), visit.visit_date.month());
            let year_key = visit.visit_date.year();
            if visit.visit_date < today {
                if visit.attended() {
                    *monthly.entry(month_key).or_default() += 1;
                    *yearly.entry(year_key).or_default() += 1;
                }
                visit.status
            } else {
                let month_used = monthly.get(&month_key).copied().unwrap_or(0);
                let year_used = yearly.get(&year_key).copied().unwrap_or(0);
                if policy.monthly.allows(month_used) && policy.yearly.allows(year_used) {
                    *monthly.entry(month_key).or_default() += 1;
                    *yearly.entry(year_key).or_default() += 1;
                    VisitStatus::Approved
                } else {
                    VisitStatus::Unapproved
                }
            }
        })
        .collect();

    let usage = QuotaUsage {
        month_used: monthly
            .get(&(today.year(), today.month()))
            .copied()
            .unwrap_or(0),
        year_used: yearly.get(&today.year()).copied().unwrap_or(0),
    };
    VisitorPass { desired, usage }
}
