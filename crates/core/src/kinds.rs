//! Principal kinds and account statuses.
//!
//! Every authenticable account (administrator, customer, seller, moderator)
//! flows through the same state machine; the kind is a tag carried on the
//! principal row and in token claims, never a reason to fork the logic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of actor a principal represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    Customer,
    Seller,
    Moderator,
}

impl PrincipalKind {
    /// The canonical lowercase string stored in the database and claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin",
            PrincipalKind::Customer => "customer",
            PrincipalKind::Seller => "seller",
            PrincipalKind::Moderator => "moderator",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(PrincipalKind::Admin),
            "customer" => Ok(PrincipalKind::Customer),
            "seller" => Ok(PrincipalKind::Seller),
            "moderator" => Ok(PrincipalKind::Moderator),
            other => Err(format!("unknown principal kind: {other}")),
        }
    }
}

/// Account status values stored in the `principals.status` column.
pub mod statuses {
    pub const PENDING: &str = "pending";
    pub const ACTIVE: &str = "active";
    pub const SUSPENDED: &str = "suspended";
}
