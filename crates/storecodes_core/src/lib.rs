//! Consistency-preserving persistence for stores and their discount codes.
//! This crate is the single owner of the ledger's cross-collection invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::discount_code::{DiscountCode, DiscountCodeId, DiscountCodePayload};
pub use model::store::{Store, StoreId, StorePayload, DEFAULT_STORE_TYPE};
pub use model::Timestamp;
pub use repo::record_table::{Record, RecordTable, RepoError, RepoResult, SqliteRecordTable};
pub use service::audit::InvariantViolation;
pub use service::consistency::{ConsistencyManager, ErrorKind, ServiceError, ServiceResult};
pub use service::providers::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
