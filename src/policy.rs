//! Quota policy table
//!
//! The per-category caps are the single seam through which limits vary;
//! nothing outside this module hard-codes a number.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::{QuotaLimitsConfig, QuotasConfig};
use crate::models::enums::VisitorCategory;

/// A cap that may be absent entirely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    Unlimited,
    Capped(u32),
}

impl Limit {
    /// Would one more unit still fit under the cap?
    pub fn allows(&self, used: u32) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Capped(cap) => used < *cap,
        }
    }

    /// Has the cap been consumed entirely?
    pub fn reached(&self, used: u32) -> bool {
        match self {
            Limit::Unlimited => false,
            Limit::Capped(cap) => used >= *cap,
        }
    }

    pub fn is_capped(&self) -> bool {
        matches!(self, Limit::Capped(_))
    }
}

impl From<Option<u32>> for Limit {
    fn from(v: Option<u32>) -> Self {
        match v {
            Some(cap) => Limit::Capped(cap),
            None => Limit::Unlimited,
        }
    }
}

/// Per-category rule set: monthly and yearly per-visitor caps plus the
/// per-host daily cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub monthly: Limit,
    pub yearly: Limit,
    pub host_daily: Limit,
}

impl QuotaPolicy {
    pub const UNLIMITED: QuotaPolicy = QuotaPolicy {
        monthly: Limit::Unlimited,
        yearly: Limit::Unlimited,
        host_daily: Limit::Unlimited,
    };
}

impl From<&QuotaLimitsConfig> for QuotaPolicy {
    fn from(cfg: &QuotaLimitsConfig) -> Self {
        Self {
            monthly: cfg.monthly.into(),
            yearly: cfg.yearly.into(),
            host_daily: cfg.host_daily.into(),
        }
    }
}

static DEFAULT_POLICIES: Lazy<QuotaPolicies> =
    Lazy::new(|| QuotaPolicies::from(&QuotasConfig::default()));

/// The full policy table, one entry per visitor category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicies {
    pub day_guest: QuotaPolicy,
    pub accommodation_guest: QuotaPolicy,
    pub supplier: QuotaPolicy,
    pub reciprocating_member: QuotaPolicy,
}

impl QuotaPolicies {
    pub fn for_category(&self, category: VisitorCategory) -> QuotaPolicy {
        match category {
            VisitorCategory::DayGuest => self.day_guest,
            VisitorCategory::AccommodationGuest => self.accommodation_guest,
            VisitorCategory::Supplier => self.supplier,
            VisitorCategory::ReciprocatingMember => self.reciprocating_member,
        }
    }
}

impl Default for QuotaPolicies {
    fn default() -> Self {
        *DEFAULT_POLICIES
    }
}

impl From<&QuotasConfig> for QuotaPolicies {
    fn from(cfg: &QuotasConfig) -> Self {
        Self {
            day_guest: QuotaPolicy::from(&cfg.day_guest),
            accommodation_guest: QuotaPolicy::from(&cfg.accommodation_guest),
            supplier: QuotaPolicy::from(&cfg.supplier),
            reciprocating_member: QuotaPolicy::from(&cfg.reciprocating_member),
        }
    }
}
