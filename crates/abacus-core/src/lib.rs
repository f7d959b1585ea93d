//! # abacus-core
//!
//! Core infrastructure for the abacus counting tools.
//!
//! Provides shared abstractions for:
//! - Error taxonomy (usage, allocation, collective-protocol failures)
//! - Modular routing arithmetic (non-negative modulo over the full signed domain)
//! - Worker identity (`WorkerId`, `WorkerContext`)

pub mod error;
pub mod hashing;
pub mod types;

pub use error::{AbacusError, Result};
pub use hashing::safe_mod;
pub use types::{WorkerContext, WorkerId, COORDINATOR};
