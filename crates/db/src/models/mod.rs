//! Entity models and DTOs.

pub mod audit;
pub mod principal;
pub mod session;

pub use audit::{AuditEvent, CreateAuditEvent};
pub use principal::{CreatePrincipal, Principal};
pub use session::{CreateSession, Session, SessionSummary};
