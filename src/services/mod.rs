//! Business logic services

pub mod jobs;
pub mod notifications;
pub mod reconciliation;
pub mod registry;
pub mod visits;

use std::sync::Arc;

use crate::{clock::Clock, policy::QuotaPolicies, repository::AccessRepository};

pub use jobs::{DailyRolloverReport, SchedulerJobs};
pub use notifications::{LoggingDispatcher, NotificationDispatcher, NotificationError};
pub use reconciliation::ReconciliationService;
pub use registry::VisitorRegistryService;
pub use visits::VisitLedgerService;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub registry: VisitorRegistryService,
    pub visits: VisitLedgerService,
    pub reconciliation: ReconciliationService,
    pub jobs: SchedulerJobs,
}

impl Services {
    /// Wire all services over the given collaborators
    pub fn new(
        repository: Arc<dyn AccessRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        policies: QuotaPolicies,
    ) -> Self {
        let registry = VisitorRegistryService::new(repository.clone());
        let reconciliation = ReconciliationService::new(
            repository.clone(),
            dispatcher.clone(),
            policies,
            clock.clone(),
        );
        let visits = VisitLedgerService::new(
            repository,
            registry.clone(),
            reconciliation.clone(),
            dispatcher,
            clock.clone(),
        );
        let jobs = SchedulerJobs::new(visits.clone(), reconciliation.clone(), clock);

        Self {
            registry,
            visits,
            reconciliation,
            jobs,
        }
    }
}
