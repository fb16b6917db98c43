//! Durable record tables.
//!
//! # Responsibility
//! - Map a record's own id to its serialized body in one SQLite table per
//!   collection.
//! - Keep SQL details out of the consistency manager.
//!
//! # Invariants
//! - Absence is a value (`Ok(None)`), never an error.
//! - Reads reject rows whose body does not decode or whose embedded id
//!   disagrees with the row key.

pub mod record_table;
