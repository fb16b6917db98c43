//! Ledger use-case services.
//!
//! # Responsibility
//! - Own every write into the record tables.
//! - Keep dispatch surfaces decoupled from storage details.

pub mod audit;
pub mod consistency;
pub mod providers;
