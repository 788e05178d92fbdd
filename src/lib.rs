//! Gatehouse Visitor Access Management Engine
//!
//! Visit lifecycle and quota reconciliation for short-term facility access
//! across four visitor categories: day guests, accommodation guests,
//! suppliers, and reciprocating-club members. Transport, persistence, and
//! notification delivery are external collaborators reached through the
//! [`repository::AccessRepository`] and
//! [`services::NotificationDispatcher`] traits.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorCode};
pub use policy::{Limit, QuotaPolicies, QuotaPolicy};
pub use services::Services;
