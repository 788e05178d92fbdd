//! Visit ledger service
//!
//! Registration, cancellation, and the sign-in/sign-out state machine.
//! Every mutation ends with the reconciliation cascade so statuses are
//! consistent before the call returns.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    models::{
        enums::{VisitStatus, VisitorCategory},
        visit::{NewVisit, RegisterVisit, Visit},
    },
    repository::AccessRepository,
    services::{
        notifications::{notify, NotificationDispatcher},
        reconciliation::ReconciliationService,
        registry::VisitorRegistryService,
    },
};

#[derive(Clone)]
pub struct VisitLedgerService {
    repository: Arc<dyn AccessRepository>,
    registry: VisitorRegistryService,
    reconciliation: ReconciliationService,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl VisitLedgerService {
    pub fn new(
        repository: Arc<dyn AccessRepository>,
        registry: VisitorRegistryService,
        reconciliation: ReconciliationService,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            reconciliation,
            dispatcher,
            clock,
        }
    }

    /// Register a visit slot for a visitor. A cancelled slot for the same
    /// date is reopened in place; otherwise a new row is inserted with the
    /// provisional status from the quota check. Ends with a full
    /// reconciliation pass and returns the settled row.
    pub async fn register_visit(&self, request: RegisterVisit) -> AppResult<Visit> {
        let visitor = self.repository.get_visitor(request.visitor_id).await?;
        let today = self.clock.today();

        if request.visit_date < today {
            return Err(AppError::Validation(format!(
                "Cannot register a visit in the past ({})",
                request.visit_date
            )));
        }
        if request.host_id.is_some() && !visitor.category.supports_host() {
            return Err(AppError::Validation(format!(
                "Category {} does not take a sponsoring host",
                visitor.category
            )));
        }
        if request.courtesy && visitor.category != VisitorCategory::DayGuest {
            return Err(AppError::Validation(
                "Courtesy visits exist only for day guests".to_string(),
            ));
        }
        if visitor.category == VisitorCategory::DayGuest
            && !request.courtesy
            && request.host_id.is_none()
        {
            return Err(AppError::Validation(
                "Day-guest visits require a sponsoring host".to_string(),
            ));
        }

        let existing = self
            .repository
            .find_visit_for_date(visitor.id, request.visit_date)
            .await?;
        if let Some(existing) = &existing {
            if existing.is_live() {
                return Err(AppError::Conflict(format!(
                    "Visitor {} already has a visit on {}",
                    visitor.id, request.visit_date
                )));
            }
        }

        let provisional = self
            .reconciliation
            .provisional_status(&visitor, request.visit_date)
            .await?;

        let visit = match existing {
            Some(cancelled) => {
                // Reuse path: reopen the cancelled slot instead of inserting.
                // created_at is refreshed so the slot re-enters the host FIFO
                // as a newcomer.
                let mut reopened = cancelled;
                reopened.status = provisional;
                reopened.host_id = request.host_id;
                reopened.courtesy = request.courtesy;
                reopened.sign_in_time = None;
                reopened.sign_out_time = None;
                reopened.created_at = self.clock.now();
                self.repository.update_visit(&reopened).await?;
                tracing::debug!(visit_id = reopened.id, "reopened cancelled visit slot");
                reopened
            }
            None => {
                self.repository
                    .insert_visit(NewVisit {
                        visitor_id: visitor.id,
                        host_id: request.host_id,
                        visit_date: request.visit_date,
                        status: provisional,
                        courtesy: request.courtesy,
                    })
                    .await?
            }
        };

        tracing::info!(
            visit_id = visit.id,
            visitor_id = visitor.id,
            date = %request.visit_date,
            status = %visit.status,
            "visit registered"
        );

        self.reconciliation.reconcile_visitor(visitor.id).await?;
        self.repository.get_visit(visit.id).await
    }

    /// Cancel a visit. Idempotent: an already-cancelled visit is a no-op
    /// success. Frees visitor quota and host capacity for the date.
    pub async fn cancel_visit(&self, visit_id: i64) -> AppResult<()> {
        let visit = self.repository.get_visit(visit_id).await?;
        if !visit.is_live() {
            return Ok(());
        }

        let old = visit.status;
        let mut cancelled = visit.clone();
        cancelled.status = VisitStatus::Cancelled;
        self.repository.update_visit(&cancelled).await?;

        let visitor = self.repository.get_visitor(visit.visitor_id).await?;
        tracing::info!(visit_id, visitor_id = visitor.id, "visit cancelled");
        notify!(self
            .dispatcher
            .on_visit_status_changed(&visitor, &cancelled, old, VisitStatus::Cancelled));

        self.reconciliation.reconcile_visitor(visit.visitor_id).await?;
        if let Some(host_id) = visit.host_id {
            // The cancelled row left the visitor's live set, so its batch
            // has to be recomputed explicitly
            self.reconciliation
                .recompute_host_batch(host_id, visit.visit_date)
                .await?;
        }
        Ok(())
    }

    /// Sign a visitor in at the gate, binding the presented identity
    /// document on first use or requiring an exact match afterwards.
    pub async fn sign_in(&self, visit_id: i64, presented_document: &str) -> AppResult<Visit> {
        let visit = self.repository.get_visit(visit_id).await?;
        if !visit.is_live() {
            return Err(AppError::Conflict("Visit is cancelled".to_string()));
        }
        if visit.sign_in_time.is_some() {
            return Err(AppError::Conflict("Visit is already signed in".to_string()));
        }
        let today = self.clock.today();
        if visit.visit_date != today {
            return Err(AppError::Conflict(format!(
                "Visit is dated {} but the operational date is {}",
                visit.visit_date, today
            )));
        }

        let visitor = self.repository.get_visitor(visit.visitor_id).await?;
        if visitor.is_restricted() {
            return Err(AppError::Restricted(format!(
                "Visitor {} is {}",
                visitor.id, visitor.status
            )));
        }

        self.registry
            .bind_identity_document(visitor.id, presented_document)
            .await?;

        let mut signed_in = visit;
        signed_in.sign_in_time = Some(self.clock.now());
        self.repository.update_visit(&signed_in).await?;
        tracing::info!(visit_id, visitor_id = visitor.id, "visitor signed in");
        notify!(self.dispatcher.on_sign_in(&visitor, &signed_in));
        Ok(signed_in)
    }

    /// Close a visit that was signed in
    pub async fn sign_out(&self, visit_id: i64) -> AppResult<Visit> {
        let visit = self.repository.get_visit(visit_id).await?;
        if visit.sign_in_time.is_none() {
            return Err(AppError::Conflict("Visit was never signed in".to_string()));
        }
        if visit.sign_out_time.is_some() {
            return Err(AppError::Conflict("Visit is already signed out".to_string()));
        }

        let mut signed_out = visit;
        signed_out.sign_out_time = Some(self.clock.now());
        self.repository.update_visit(&signed_out).await?;

        let visitor = self.repository.get_visitor(signed_out.visitor_id).await?;
        tracing::info!(visit_id, visitor_id = visitor.id, "visitor signed out");
        notify!(self.dispatcher.on_sign_out(&visitor, &signed_out));
        Ok(signed_out)
    }

    /// Force-close every visit of `prior_date` that was signed in but never
    /// signed out, stamping 23:59:59 of that date. Idempotent: a second run
    /// finds nothing open.
    pub async fn auto_sign_out_stale_visits(&self, prior_date: NaiveDate) -> AppResult<usize> {
        let end_of_day = prior_date
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is a valid wall-clock time")
            .and_utc();

        let open = self.repository.find_open_visits(prior_date).await?;
        let closed = open.len();
        for visit in open {
            let mut stale = visit;
            stale.sign_out_time = Some(end_of_day);
            self.repository.update_visit(&stale).await?;

            let visitor = self.repository.get_visitor(stale.visitor_id).await?;
            tracing::info!(
                visit_id = stale.id,
                visitor_id = visitor.id,
                "auto signed out stale visit"
            );
            notify!(self.dispatcher.on_sign_out(&visitor, &stale));
        }
        Ok(closed)
    }
}
