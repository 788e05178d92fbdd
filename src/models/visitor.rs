//! Visitor model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::{SuspensionReason, VisitorCategory, VisitorStatus};

/// Communication opt-ins carried on the visitor profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPrefs {
    pub email_opt_in: bool,
    pub sms_opt_in: bool,
}

/// A person tracked under one of the four categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    pub category: VisitorCategory,
    pub name: String,
    /// Dedup key within the category
    pub phone: String,
    pub email: Option<String>,
    /// Set once at first sign-in, then immutable; unique within the category
    pub identity_document: Option<String>,
    pub status: VisitorStatus,
    pub suspension_reason: Option<SuspensionReason>,
    pub prefs: ContactPrefs,
    pub created_at: DateTime<Utc>,
}

impl Visitor {
    pub fn is_restricted(&self) -> bool {
        self.status.is_restricted()
    }

    /// True when the reset jobs are allowed to reactivate this visitor
    pub fn is_quota_suspended(&self) -> bool {
        self.status == VisitorStatus::Suspended
            && self.suspension_reason == Some(SuspensionReason::Quota)
    }
}

/// Registration payload for the find-or-create lookup
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterVisitor {
    pub category: VisitorCategory,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 3, message = "phone number is too short"))]
    pub phone: String,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub prefs: ContactPrefs,
}

/// Row to insert when no visitor matches (category, phone)
#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub category: VisitorCategory,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub prefs: ContactPrefs,
}

impl From<RegisterVisitor> for NewVisitor {
    fn from(req: RegisterVisitor) -> Self {
        Self {
            category: req.category,
            name: req.name,
            phone: req.phone,
            email: req.email,
            prefs: req.prefs,
        }
    }
}
