//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction, where row locking or atomic
//! multi-statement updates are required) as the first argument.

pub mod audit_repo;
pub mod principal_repo;
pub mod session_repo;

pub use audit_repo::AuditEventRepo;
pub use principal_repo::PrincipalRepo;
pub use session_repo::SessionRepo;
