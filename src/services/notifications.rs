//! Notification dispatch boundary
//!
//! Delivery (SMS/email bodies, transport) lives outside the engine. The
//! engine only announces state transitions through this trait; dispatch is
//! fire-and-forget and a delivery failure never fails the operation that
//! triggered it.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    enums::{VisitStatus, VisitorStatus},
    visit::Visit,
    visitor::Visitor,
};

/// Dispatch failure; logged at the call site and discarded
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound event hooks consumed by SMS/email adapters
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn on_sign_in(&self, visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError>;

    async fn on_sign_out(&self, visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError>;

    async fn on_visitor_status_changed(
        &self,
        visitor: &Visitor,
        old: VisitorStatus,
        new: VisitorStatus,
    ) -> Result<(), NotificationError>;

    async fn on_visit_status_changed(
        &self,
        visitor: &Visitor,
        visit: &Visit,
        old: VisitStatus,
        new: VisitStatus,
    ) -> Result<(), NotificationError>;

    async fn on_host_limit_exceeded(
        &self,
        host_id: i64,
        date: NaiveDate,
        unapproved_count: u32,
    ) -> Result<(), NotificationError>;
}

/// Default dispatcher: traces every event and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn on_sign_in(&self, visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError> {
        tracing::info!(visitor_id = visitor.id, visit_id = visit.id, "visitor signed in");
        Ok(())
    }

    async fn on_sign_out(&self, visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError> {
        tracing::info!(visitor_id = visitor.id, visit_id = visit.id, "visitor signed out");
        Ok(())
    }

    async fn on_visitor_status_changed(
        &self,
        visitor: &Visitor,
        old: VisitorStatus,
        new: VisitorStatus,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            visitor_id = visitor.id,
            old = %old,
            new = %new,
            "visitor status changed"
        );
        Ok(())
    }

    async fn on_visit_status_changed(
        &self,
        visitor: &Visitor,
        visit: &Visit,
        old: VisitStatus,
        new: VisitStatus,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            visitor_id = visitor.id,
            visit_id = visit.id,
            old = %old,
            new = %new,
            "visit status changed"
        );
        Ok(())
    }

    async fn on_host_limit_exceeded(
        &self,
        host_id: i64,
        date: NaiveDate,
        unapproved_count: u32,
    ) -> Result<(), NotificationError> {
        tracing::info!(host_id, %date, unapproved_count, "host daily limit exceeded");
        Ok(())
    }
}

/// Await a dispatcher call, log a failure at warn, and move on. Keeps the
/// engine's return path free of notification errors.
macro_rules! notify {
    ($call:expr) => {
        if let Err(err) = $call.await {
            tracing::warn!(error = %err, "notification dispatch failed");
        }
    };
}

pub(crate) use notify;
