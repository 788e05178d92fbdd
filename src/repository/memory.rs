//! In-memory repository
//!
//! Reference implementation backing the test suite and embedders that do
//! not need durable storage. Enforces the same uniqueness constraints a
//! production schema would carry.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    clock::{Clock, SystemClock},
    error::{AppError, AppResult},
    models::{
        enums::{SuspensionReason, VisitStatus, VisitorCategory, VisitorStatus},
        visit::{NewVisit, Visit},
        visitor::{NewVisitor, Visitor},
    },
};

use super::AccessRepository;

#[derive(Debug, Default)]
struct Inner {
    visitors: BTreeMap<i64, Visitor>,
    visits: BTreeMap<i64, Visit>,
    next_visitor_id: i64,
    next_visit_id: i64,
}

/// Mutex-guarded store; every operation is a single critical section, which
/// gives the atomicity the trait contract requires.
pub struct MemoryRepository {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store stamping created_at from the given clock, so tests drive
    /// creation order deterministically
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Persistence("repository lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccessRepository for MemoryRepository {
    async fn find_visitor_by_phone(
        &self,
        category: VisitorCategory,
        phone: &str,
    ) -> AppResult<Option<Visitor>> {
        let inner = self.lock()?;
        Ok(inner
            .visitors
            .values()
            .find(|v| v.category == category && v.phone == phone)
            .cloned())
    }

    async fn find_visitor_by_document(
        &self,
        category: VisitorCategory,
        document: &str,
    ) -> AppResult<Option<Visitor>> {
        let inner = self.lock()?;
        Ok(inner
            .visitors
            .values()
            .find(|v| v.category == category && v.identity_document.as_deref() == Some(document))
            .cloned())
    }

    async fn get_visitor(&self, id: i64) -> AppResult<Visitor> {
        let inner = self.lock()?;
        inner
            .visitors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))
    }

    async fn create_visitor(&self, visitor: NewVisitor) -> AppResult<Visitor> {
        let mut inner = self.lock()?;
        inner.next_visitor_id += 1;
        let id = inner.next_visitor_id;
        let row = Visitor {
            id,
            category: visitor.category,
            name: visitor.name,
            phone: visitor.phone,
            email: visitor.email,
            identity_document: None,
            status: VisitorStatus::Active,
            suspension_reason: None,
            prefs: visitor.prefs,
            created_at: self.clock.now(),
        };
        inner.visitors.insert(id, row.clone());
        Ok(row)
    }

    async fn update_visitor_status(
        &self,
        id: i64,
        status: VisitorStatus,
        reason: Option<SuspensionReason>,
    ) -> AppResult<()> {
        let mut inner = self.lock()?;
        let visitor = inner
            .visitors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))?;
        visitor.status = status;
        visitor.suspension_reason = reason;
        Ok(())
    }

    async fn bind_visitor_document(&self, id: i64, document: &str) -> AppResult<()> {
        let mut inner = self.lock()?;
        let category = inner
            .visitors
            .get(&id)
            .map(|v| v.category)
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))?;

        // Unique-within-category constraint
        if inner.visitors.values().any(|v| {
            v.id != id && v.category == category && v.identity_document.as_deref() == Some(document)
        }) {
            return Err(AppError::Conflict(format!(
                "Document {} is already bound to another visitor",
                document
            )));
        }

        let visitor = inner
            .visitors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))?;
        match &visitor.identity_document {
            Some(existing) if existing != document => Err(AppError::Conflict(
                "Visitor already has a different document bound".to_string(),
            )),
            _ => {
                visitor.identity_document = Some(document.to_string());
                Ok(())
            }
        }
    }

    async fn list_visitors_by_status(&self, status: VisitorStatus) -> AppResult<Vec<Visitor>> {
        let inner = self.lock()?;
        Ok(inner
            .visitors
            .values()
            .filter(|v| v.status == status)
            .cloned()
            .collect())
    }

    async fn get_visit(&self, id: i64) -> AppResult<Visit> {
        let inner = self.lock()?;
        inner
            .visits
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))
    }

    async fn find_visit_for_date(
        &self,
        visitor_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<Visit>> {
        let inner = self.lock()?;
        let mut found: Option<Visit> = None;
        for visit in inner.visits.values() {
            if visit.visitor_id != visitor_id || visit.visit_date != date {
                continue;
            }
            if visit.is_live() {
                return Ok(Some(visit.clone()));
            }
            found.get_or_insert_with(|| visit.clone());
        }
        Ok(found)
    }

    async fn find_visits_by_visitor(&self, visitor_id: i64) -> AppResult<Vec<Visit>> {
        let inner = self.lock()?;
        let mut visits: Vec<Visit> = inner
            .visits
            .values()
            .filter(|v| v.visitor_id == visitor_id && v.is_live())
            .cloned()
            .collect();
        visits.sort_by(|a, b| {
            a.visit_date
                .cmp(&b.visit_date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(visits)
    }

    async fn find_visits_by_host_and_date(
        &self,
        host_id: i64,
        date: NaiveDate,
    ) -> AppResult<Vec<Visit>> {
        let inner = self.lock()?;
        let mut visits: Vec<Visit> = inner
            .visits
            .values()
            .filter(|v| v.host_id == Some(host_id) && v.visit_date == date && v.is_live())
            .cloned()
            .collect();
        visits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(visits)
    }

    async fn insert_visit(&self, visit: NewVisit) -> AppResult<Visit> {
        let mut inner = self.lock()?;

        // Partial unique constraint on (visitor_id, visit_date) over live rows
        if inner.visits.values().any(|v| {
            v.visitor_id == visit.visitor_id && v.visit_date == visit.visit_date && v.is_live()
        }) && visit.status != VisitStatus::Cancelled
        {
            return Err(AppError::Conflict(format!(
                "Visitor {} already has a visit on {}",
                visit.visitor_id, visit.visit_date
            )));
        }

        inner.next_visit_id += 1;
        let id = inner.next_visit_id;
        let row = Visit {
            id,
            visitor_id: visit.visitor_id,
            host_id: visit.host_id,
            visit_date: visit.visit_date,
            status: visit.status,
            sign_in_time: None,
            sign_out_time: None,
            courtesy: visit.courtesy,
            created_at: self.clock.now(),
        };
        inner.visits.insert(id, row.clone());
        Ok(row)
    }

    async fn update_visit(&self, visit: &Visit) -> AppResult<()> {
        let mut inner = self.lock()?;

        // The live-slot constraint also guards updates that resurrect a row
        if visit.is_live()
            && inner.visits.values().any(|v| {
                v.id != visit.id
                    && v.visitor_id == visit.visitor_id
                    && v.visit_date == visit.visit_date
                    && v.is_live()
            })
        {
            return Err(AppError::Conflict(format!(
                "Visitor {} already has a visit on {}",
                visit.visitor_id, visit.visit_date
            )));
        }

        match inner.visits.get_mut(&visit.id) {
            Some(row) => {
                *row = visit.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Visit with id {} not found",
                visit.id
            ))),
        }
    }

    async fn find_open_visits(&self, date: NaiveDate) -> AppResult<Vec<Visit>> {
        let inner = self.lock()?;
        Ok(inner
            .visits
            .values()
            // Cancellation does not erase an open sign-in, so cancelled rows
            // are still candidates for the forced close
            .filter(|v| {
                v.visit_date == date && v.sign_in_time.is_some() && v.sign_out_time.is_none()
            })
            .cloned()
            .collect())
    }
}
