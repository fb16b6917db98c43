//! Record types persisted by the ledger and the validators shared by every
//! operation that accepts caller input.
//!
//! # Invariants
//! - Record ids are canonical UUIDs, assigned once and never reused.
//! - `Store::code_count` is derived state; only the consistency manager
//!   writes it.

pub mod discount_code;
pub mod store;
pub mod validate;

/// Unix epoch milliseconds.
pub type Timestamp = i64;
