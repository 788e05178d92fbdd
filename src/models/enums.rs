//! Shared domain enums

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// VisitorCategory
// ---------------------------------------------------------------------------

/// Visitor categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum VisitorCategory {
    DayGuest = 1,
    AccommodationGuest = 2,
    Supplier = 3,
    ReciprocatingMember = 4,
}

impl VisitorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorCategory::DayGuest => "day_guest",
            VisitorCategory::AccommodationGuest => "accommodation_guest",
            VisitorCategory::Supplier => "supplier",
            VisitorCategory::ReciprocatingMember => "reciprocating_member",
        }
    }

    /// Only day guests carry a sponsoring host
    pub fn supports_host(&self) -> bool {
        matches!(self, VisitorCategory::DayGuest)
    }
}

impl std::fmt::Display for VisitorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VisitorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day_guest" => Ok(VisitorCategory::DayGuest),
            "accommodation_guest" => Ok(VisitorCategory::AccommodationGuest),
            "supplier" => Ok(VisitorCategory::Supplier),
            "reciprocating_member" => Ok(VisitorCategory::ReciprocatingMember),
            _ => Err(format!("Invalid visitor category: {}", s)),
        }
    }
}

impl From<VisitorCategory> for i16 {
    fn from(c: VisitorCategory) -> Self {
        c as i16
    }
}

// ---------------------------------------------------------------------------
// VisitorStatus
// ---------------------------------------------------------------------------

/// Visitor account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum VisitorStatus {
    Active = 0,
    Suspended = 1,
    Banned = 2,
}

impl VisitorStatus {
    /// Suspended and banned visitors may not sign in
    pub fn is_restricted(&self) -> bool {
        matches!(self, VisitorStatus::Suspended | VisitorStatus::Banned)
    }
}

impl std::fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VisitorStatus::Active => "active",
            VisitorStatus::Suspended => "suspended",
            VisitorStatus::Banned => "banned",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// SuspensionReason
// ---------------------------------------------------------------------------

/// Why a visitor is suspended. Reset jobs reactivate only quota
/// suspensions; manual ones stay until staff lift them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum SuspensionReason {
    Manual = 1,
    Quota = 2,
}

// ---------------------------------------------------------------------------
// VisitStatus
// ---------------------------------------------------------------------------

/// Visit approval lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum VisitStatus {
    Unapproved = 0,
    Approved = 1,
    Cancelled = 2,
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VisitStatus::Unapproved => "unapproved",
            VisitStatus::Approved => "approved",
            VisitStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}
