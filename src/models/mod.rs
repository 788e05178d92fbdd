//! Domain models

pub mod enums;
pub mod visit;
pub mod visitor;

pub use enums::{SuspensionReason, VisitStatus, VisitorCategory, VisitorStatus};
pub use visit::{NewVisit, RegisterVisit, Visit};
pub use visitor::{ContactPrefs, NewVisitor, RegisterVisitor, Visitor};
