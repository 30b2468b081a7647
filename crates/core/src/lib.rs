//! Shared domain types, error taxonomy, and pure helpers used by every
//! Twyn backend crate.

pub mod error;
pub mod ids;
pub mod keys;
pub mod limits;
pub mod types;
pub mod validation;
