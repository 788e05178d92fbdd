//! Shared test harness: in-memory repository, recording dispatcher, and a
//! manually driven clock.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::NaiveDate;

use gatehouse::{
    models::{
        ContactPrefs, RegisterVisit, RegisterVisitor, Visit, VisitStatus, Visitor,
        VisitorCategory, VisitorStatus,
    },
    repository::MemoryRepository,
    services::{NotificationDispatcher, NotificationError},
    ManualClock, QuotaPolicies, Services,
};

/// Every event the engine emitted, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SignIn {
        visit_id: i64,
    },
    SignOut {
        visit_id: i64,
    },
    VisitorStatus {
        visitor_id: i64,
        old: VisitorStatus,
        new: VisitorStatus,
    },
    VisitStatus {
        visit_id: i64,
        old: VisitStatus,
        new: VisitStatus,
    },
    HostLimitExceeded {
        host_id: i64,
        date: NaiveDate,
        unapproved_count: u32,
    },
}

/// Dispatcher double that records every emission
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<Event>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("events lock poisoned").clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("events lock poisoned").push(event);
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn on_sign_in(&self, _visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError> {
        self.push(Event::SignIn { visit_id: visit.id });
        Ok(())
    }

    async fn on_sign_out(&self, _visitor: &Visitor, visit: &Visit) -> Result<(), NotificationError> {
        self.push(Event::SignOut { visit_id: visit.id });
        Ok(())
    }

    async fn on_visitor_status_changed(
        &self,
        visitor: &Visitor,
        old: VisitorStatus,
        new: VisitorStatus,
    ) -> Result<(), NotificationError> {
        self.push(Event::VisitorStatus {
            visitor_id: visitor.id,
            old,
            new,
        });
        Ok(())
    }

    async fn on_visit_status_changed(
        &self,
        _visitor: &Visitor,
        visit: &Visit,
        old: VisitStatus,
        new: VisitStatus,
    ) -> Result<(), NotificationError> {
        self.push(Event::VisitStatus {
            visit_id: visit.id,
            old,
            new,
        });
        Ok(())
    }

    async fn on_host_limit_exceeded(
        &self,
        host_id: i64,
        date: NaiveDate,
        unapproved_count: u32,
    ) -> Result<(), NotificationError> {
        self.push(Event::HostLimitExceeded {
            host_id,
            date,
            unapproved_count,
        });
        Ok(())
    }
}

pub struct Harness {
    pub services: Services,
    pub repository: Arc<MemoryRepository>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub clock: Arc<ManualClock>,
}

static TRACING: Once = Once::new();

/// Opt-in engine logs during a test run: RUST_LOG=gatehouse=debug
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Engine wired over the in-memory repository with the default policy
/// table, frozen at midnight of the given operational date
pub fn harness(today: NaiveDate) -> Harness {
    init_tracing();
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let clock = Arc::new(ManualClock::at_midnight(today));
    let repository = Arc::new(MemoryRepository::with_clock(clock.clone()));
    let services = Services::new(
        repository.clone(),
        dispatcher.clone(),
        clock.clone(),
        QuotaPolicies::default(),
    );
    Harness {
        services,
        repository,
        dispatcher,
        clock,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn day_guest(h: &Harness, phone: &str, name: &str) -> Visitor {
    h.services
        .registry
        .find_or_create(RegisterVisitor {
            category: VisitorCategory::DayGuest,
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            prefs: ContactPrefs::default(),
        })
        .await
        .expect("visitor registration succeeds")
}

pub async fn visitor_of(h: &Harness, category: VisitorCategory, phone: &str) -> Visitor {
    h.services
        .registry
        .find_or_create(RegisterVisitor {
            category,
            name: "Test Visitor".to_string(),
            phone: phone.to_string(),
            email: None,
            prefs: ContactPrefs::default(),
        })
        .await
        .expect("visitor registration succeeds")
}

pub async fn hosted_visit(
    h: &Harness,
    visitor_id: i64,
    host_id: i64,
    visit_date: NaiveDate,
) -> Visit {
    h.services
        .visits
        .register_visit(RegisterVisit {
            visitor_id,
            host_id: Some(host_id),
            visit_date,
            courtesy: false,
        })
        .await
        .expect("visit registration succeeds")
}

pub async fn courtesy_visit(h: &Harness, visitor_id: i64, visit_date: NaiveDate) -> Visit {
    h.services
        .visits
        .register_visit(RegisterVisit {
            visitor_id,
            host_id: None,
            visit_date,
            courtesy: true,
        })
        .await
        .expect("visit registration succeeds")
}
