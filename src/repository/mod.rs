//! Repository layer
//!
//! Persistence technology is an external collaborator; the engine talks to
//! it through this trait. Implementations must enforce the uniqueness
//! invariants atomically: at most one non-cancelled visit per
//! (visitor_id, visit_date), and identity documents unique within a
//! category. The engine's own check-then-insert sequence is not atomic, so
//! the storage-level constraint is what closes the race between concurrent
//! registrations for the same slot.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        enums::{SuspensionReason, VisitorCategory, VisitorStatus},
        visit::{NewVisit, Visit},
        visitor::{NewVisitor, Visitor},
    },
};

pub use memory::MemoryRepository;

/// Storage abstraction for visitors and visits
#[async_trait]
pub trait AccessRepository: Send + Sync {
    // ---- Visitors ----

    async fn find_visitor_by_phone(
        &self,
        category: VisitorCategory,
        phone: &str,
    ) -> AppResult<Option<Visitor>>;

    async fn find_visitor_by_document(
        &self,
        category: VisitorCategory,
        document: &str,
    ) -> AppResult<Option<Visitor>>;

    /// Fails with NotFound for an unknown id
    async fn get_visitor(&self, id: i64) -> AppResult<Visitor>;

    async fn create_visitor(&self, visitor: NewVisitor) -> AppResult<Visitor>;

    async fn update_visitor_status(
        &self,
        id: i64,
        status: VisitorStatus,
        reason: Option<SuspensionReason>,
    ) -> AppResult<()>;

    /// Set-once document binding; Conflict if the document is already held
    /// by another visitor in the category
    async fn bind_visitor_document(&self, id: i64, document: &str) -> AppResult<()>;

    async fn list_visitors_by_status(&self, status: VisitorStatus) -> AppResult<Vec<Visitor>>;

    // ---- Visits ----

    /// Fails with NotFound for an unknown id
    async fn get_visit(&self, id: i64) -> AppResult<Visit>;

    /// The slot row for (visitor, date) regardless of status; the live row
    /// wins when a cancelled row coexists with a reopened one
    async fn find_visit_for_date(
        &self,
        visitor_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<Visit>>;

    /// Non-cancelled visits for a visitor, ordered by visit_date then
    /// created_at ascending
    async fn find_visits_by_visitor(&self, visitor_id: i64) -> AppResult<Vec<Visit>>;

    /// Non-cancelled visits for a host on a date, ordered by created_at
    /// ascending (FIFO)
    async fn find_visits_by_host_and_date(
        &self,
        host_id: i64,
        date: NaiveDate,
    ) -> AppResult<Vec<Visit>>;

    /// Conflict when a live row already occupies (visitor_id, visit_date)
    async fn insert_visit(&self, visit: NewVisit) -> AppResult<Visit>;

    async fn update_visit(&self, visit: &Visit) -> AppResult<()>;

    /// Visits of the given date with a sign-in but no sign-out
    async fn find_open_visits(&self, date: NaiveDate) -> AppResult<Vec<Visit>>;
}
