//! Domain logic for the credential and session lifecycle service.
//!
//! This crate is deliberately free of I/O so its decision logic (lockout
//! policy, principal kinds, error taxonomy) can be unit-tested in isolation
//! and reused by the repository and API layers.

pub mod audit;
pub mod error;
pub mod kinds;
pub mod lockout;
pub mod types;
