//! Visit model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::VisitStatus;

/// A single dated access request tied to a visitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub visitor_id: i64,
    /// Sponsoring member, day-guest category only
    pub host_id: Option<i64>,
    /// Calendar date, no time component
    pub visit_date: NaiveDate,
    pub status: VisitStatus,
    pub sign_in_time: Option<DateTime<Utc>>,
    pub sign_out_time: Option<DateTime<Utc>>,
    /// Courtesy visits carry no host but still consume visitor quota
    pub courtesy: bool,
    /// FIFO tie-break for the host daily batch
    pub created_at: DateTime<Utc>,
}

impl Visit {
    pub fn is_live(&self) -> bool {
        self.status != VisitStatus::Cancelled
    }

    /// The visit was actually attended (guest showed up at the gate)
    pub fn attended(&self) -> bool {
        self.sign_in_time.is_some()
    }
}

/// Registration request for a visit slot
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterVisit {
    pub visitor_id: i64,
    pub host_id: Option<i64>,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub courtesy: bool,
}

/// Row to insert for a brand-new visit slot
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub visitor_id: i64,
    pub host_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub status: VisitStatus,
    pub courtesy: bool,
}
