//! Consistency manager for stores and their discount codes.
//!
//! # Responsibility
//! - Be the only write path into the `stores` and `discount_codes` tables.
//! - Validate identifiers and payloads before any storage access.
//! - Maintain the derived `code_count` and cascade store deletion.
//!
//! # Invariants
//! - Every discount code referenced an existing store when it was created.
//! - `store.code_count` equals the number of codes whose `store_id` is the
//!   store, after every completed operation.
//! - Each mutating operation commits all of its writes in one SQLite
//!   transaction or none of them.
//! - Title uniqueness is checked on creation only. `update_store` may leave
//!   two stores with the same title.

use super::audit::{audit_records, InvariantViolation};
use super::providers::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use crate::model::discount_code::{DiscountCode, DiscountCodeId, DiscountCodePayload};
use crate::model::store::{Store, StoreId, StorePayload};
use crate::model::validate::{parse_identifier, require_non_empty, InputError};
use crate::repo::record_table::{
    ensure_tables_ready, RecordTable, RepoError, RepoResult, SqliteRecordTable,
};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error category exposed to dispatch surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidIdentifier,
    ValidationError,
    Conflict,
    NotFound,
    CascadeFailure,
    Storage,
    Inconsistent,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::ValidationError => "validation_error",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::CascadeFailure => "cascade_failure",
            Self::Storage => "storage",
            Self::Inconsistent => "inconsistent",
        }
    }

    /// Whether the caller can fix the failure by changing its input.
    pub fn is_caller_error(self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier | Self::ValidationError | Self::Conflict | Self::NotFound
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every ledger operation.
#[derive(Debug)]
pub enum ServiceError {
    /// Identifier text is not a canonical UUID. Raised before any lookup.
    InvalidIdentifier(String),
    /// Required payload field is absent or empty.
    Validation(&'static str),
    /// Another store already uses this title.
    Conflict(String),
    StoreNotFound(StoreId),
    DiscountCodeNotFound(DiscountCodeId),
    /// Dependent codes could not be removed; the store was left in place.
    CascadeFailure {
        store_id: StoreId,
        source: RepoError,
    },
    /// Persisted state contradicts a ledger invariant.
    InconsistentState(String),
    /// Storage substrate failure.
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StoreNotFound(_) | Self::DiscountCodeNotFound(_) => ErrorKind::NotFound,
            Self::CascadeFailure { .. } => ErrorKind::CascadeFailure,
            Self::InconsistentState(_) => ErrorKind::Inconsistent,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(raw) => {
                write!(f, "invalid identifier `{raw}`: expected a canonical UUID")
            }
            Self::Validation(field) => write!(f, "the store {field} is required"),
            Self::Conflict(title) => write!(f, "a store titled `{title}` already exists"),
            Self::StoreNotFound(id) => write!(f, "store not found: {id}"),
            Self::DiscountCodeNotFound(id) => write!(f, "discount code not found: {id}"),
            Self::CascadeFailure { store_id, source } => write!(
                f,
                "cannot delete discount codes of store {store_id}: {source}"
            ),
            Self::InconsistentState(details) => write!(f, "inconsistent ledger state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CascadeFailure { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InputError> for ServiceError {
    fn from(value: InputError) -> Self {
        match value {
            InputError::InvalidIdentifier(raw) => Self::InvalidIdentifier(raw),
            InputError::MissingField(field) => Self::Validation(field),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Both record tables bound to one open transaction.
struct Tables<'tx> {
    stores: SqliteRecordTable<'tx, Store>,
    codes: SqliteRecordTable<'tx, DiscountCode>,
}

impl<'tx> Tables<'tx> {
    fn over(conn: &'tx Connection) -> Self {
        Self {
            stores: SqliteRecordTable::new(conn),
            codes: SqliteRecordTable::new(conn),
        }
    }

    fn require_store(&self, store_id: StoreId) -> ServiceResult<Store> {
        self.stores
            .get(store_id)?
            .ok_or(ServiceError::StoreNotFound(store_id))
    }

    fn codes_of(&self, store_id: StoreId) -> RepoResult<Vec<DiscountCode>> {
        Ok(self
            .codes
            .list()?
            .into_iter()
            .filter(|code| code.store_id == store_id)
            .collect())
    }
}

/// Entry point for all store and discount-code operations.
pub struct ConsistencyManager<'conn, C = SystemClock, G = RandomIdGenerator> {
    conn: &'conn Connection,
    clock: C,
    ids: G,
}

impl<'conn> ConsistencyManager<'conn> {
    /// Creates a manager over a migrated connection with wall-clock time and
    /// random identifiers.
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Self::with_providers(conn, SystemClock, RandomIdGenerator)
    }
}

impl<'conn, C: Clock, G: IdGenerator> ConsistencyManager<'conn, C, G> {
    /// Creates a manager with explicit time and identifier sources.
    pub fn with_providers(conn: &'conn Connection, clock: C, ids: G) -> ServiceResult<Self> {
        ensure_tables_ready(conn)?;
        Ok(Self { conn, clock, ids })
    }

    /// Lists every store in first-insertion order.
    pub fn list_stores(&self) -> ServiceResult<Vec<Store>> {
        observed("store_list", || self.read(|tables| Ok(tables.stores.list()?)))
    }

    pub fn get_store(&self, id: &str) -> ServiceResult<Store> {
        observed("store_get", || {
            let store_id = parse_identifier(id)?;
            self.read(|tables| tables.require_store(store_id))
        })
    }

    /// Creates a store with a fresh id and `code_count = 0`.
    ///
    /// # Errors
    /// - `Validation("title")` when the title is absent or empty.
    /// - `Conflict` when another store already has the exact title.
    pub fn add_store(&self, payload: &StorePayload) -> ServiceResult<Store> {
        observed("store_add", || {
            let title = require_non_empty("title", payload.title.as_deref())?;

            self.write(|tables| {
                if tables.stores.list()?.iter().any(|store| store.title == title) {
                    return Err(ServiceError::Conflict(title.to_string()));
                }

                let store_id = self.fresh_id(|id| Ok(tables.stores.get(id)?.is_some()))?;
                let store = Store::create(
                    store_id,
                    title,
                    payload.resolved_kind(),
                    self.clock.now_ms(),
                );
                tables.stores.insert(store.id, &store)?;

                info!("event=store_add module=service status=created store_id={store_id}");
                Ok(store)
            })
        })
    }

    /// Replaces title (and `type`, when supplied) of an existing store.
    ///
    /// `id`, `created_at` and `code_count` are preserved. Title uniqueness is
    /// not re-checked here.
    pub fn update_store(&self, id: &str, payload: &StorePayload) -> ServiceResult<Store> {
        observed("store_update", || {
            let store_id = parse_identifier(id)?;
            let title = require_non_empty("title", payload.title.as_deref())?;

            self.write(|tables| {
                let mut store = tables.require_store(store_id)?;
                store.title = title.to_string();
                if let Some(kind) = payload.kind.as_deref() {
                    store.kind = kind.to_string();
                }
                store.touch(self.clock.now_ms());
                tables.stores.insert(store_id, &store)?;
                Ok(store)
            })
        })
    }

    /// Deletes a store together with every discount code it owns.
    ///
    /// # Errors
    /// - `CascadeFailure` when the owned codes cannot be enumerated or
    ///   removed. Nothing is committed in that case.
    pub fn delete_store(&self, id: &str) -> ServiceResult<Store> {
        observed("store_delete", || {
            let store_id = parse_identifier(id)?;

            self.write(|tables| {
                let store = tables.require_store(store_id)?;
                let removed_codes = cascade_discount_codes(tables, store_id)
                    .map_err(|source| ServiceError::CascadeFailure { store_id, source })?;

                if u32::try_from(removed_codes).ok() != Some(store.code_count) {
                    warn!(
                        "event=store_delete module=service status=count_mismatch store_id={store_id} recorded={} removed={removed_codes}",
                        store.code_count
                    );
                }

                let removed = tables.stores.remove(store_id)?.ok_or_else(|| {
                    ServiceError::InconsistentState(format!(
                        "store {store_id} vanished during its own deletion"
                    ))
                })?;

                info!(
                    "event=store_delete module=service status=cascaded store_id={store_id} removed_codes={removed_codes}"
                );
                Ok(removed)
            })
        })
    }

    /// Lists the discount codes owned by one store.
    pub fn list_store_discount_codes(&self, store_id: &str) -> ServiceResult<Vec<DiscountCode>> {
        observed("discount_list", || {
            let store_id = parse_identifier(store_id)?;
            self.read(|tables| {
                tables.require_store(store_id)?;
                Ok(tables.codes_of(store_id)?)
            })
        })
    }

    /// Creates a discount code and bumps its store's `code_count` in the
    /// same transaction.
    pub fn add_store_discount_code(
        &self,
        store_id: &str,
        payload: &DiscountCodePayload,
    ) -> ServiceResult<DiscountCode> {
        observed("discount_add", || {
            let store_id = parse_identifier(store_id)?;

            self.write(|tables| {
                let mut store = tables.require_store(store_id)?;
                let now = self.clock.now_ms();

                let code_id = self.fresh_id(|id| Ok(tables.codes.get(id)?.is_some()))?;
                let code = DiscountCode::create(code_id, store_id, payload, now);
                tables.codes.insert(code.id, &code)?;

                store.code_count = store.code_count.checked_add(1).ok_or_else(|| {
                    ServiceError::InconsistentState(format!(
                        "code_count overflow for store {store_id}"
                    ))
                })?;
                store.touch(now);
                tables.stores.insert(store_id, &store)?;

                info!(
                    "event=discount_add module=service status=created store_id={store_id} code_id={code_id} code_count={}",
                    store.code_count
                );
                Ok(code)
            })
        })
    }

    /// Deletes one discount code and decrements its owner's `code_count`.
    ///
    /// When the owning store no longer exists the decrement is skipped.
    ///
    /// # Errors
    /// - `InconsistentState` when the owner's `code_count` is already zero.
    pub fn delete_discount(&self, id: &str) -> ServiceResult<DiscountCode> {
        observed("discount_delete", || {
            let code_id = parse_identifier(id)?;

            self.write(|tables| {
                let code = tables
                    .codes
                    .get(code_id)?
                    .ok_or(ServiceError::DiscountCodeNotFound(code_id))?;

                match tables.stores.get(code.store_id)? {
                    Some(mut store) => {
                        store.code_count = store.code_count.checked_sub(1).ok_or_else(|| {
                            ServiceError::InconsistentState(format!(
                                "store {} has code_count 0 but owns code {code_id}",
                                store.id
                            ))
                        })?;
                        store.touch(self.clock.now_ms());
                        tables.stores.insert(store.id, &store)?;
                    }
                    None => warn!(
                        "event=discount_delete module=service status=orphaned code_id={code_id} store_id={}",
                        code.store_id
                    ),
                }

                tables.codes.remove(code_id)?.ok_or_else(|| {
                    ServiceError::InconsistentState(format!(
                        "discount code {code_id} vanished during its own deletion"
                    ))
                })
            })
        })
    }

    pub fn get_discount_code(&self, id: &str) -> ServiceResult<DiscountCode> {
        observed("discount_get", || {
            let code_id = parse_identifier(id)?;
            self.read(|tables| {
                tables
                    .codes
                    .get(code_id)?
                    .ok_or(ServiceError::DiscountCodeNotFound(code_id))
            })
        })
    }

    /// Scans both tables and reports every invariant breach found.
    ///
    /// An empty result means the ledger is consistent.
    pub fn verify_invariants(&self) -> ServiceResult<Vec<InvariantViolation>> {
        observed("ledger_audit", || {
            let violations = self.read(|tables| {
                let stores = tables.stores.list()?;
                let codes = tables.codes.list()?;
                Ok(audit_records(&stores, &codes))
            })?;
            if !violations.is_empty() {
                warn!(
                    "event=ledger_audit module=service status=violations count={}",
                    violations.len()
                );
            }
            Ok(violations)
        })
    }

    fn read<T>(&self, work: impl FnOnce(&Tables<'_>) -> ServiceResult<T>) -> ServiceResult<T> {
        self.in_transaction(TransactionBehavior::Deferred, work)
    }

    fn write<T>(&self, work: impl FnOnce(&Tables<'_>) -> ServiceResult<T>) -> ServiceResult<T> {
        self.in_transaction(TransactionBehavior::Immediate, work)
    }

    /// Runs `work` inside one transaction. Any error drops the transaction,
    /// which rolls back every write made by `work`.
    fn in_transaction<T>(
        &self,
        behavior: TransactionBehavior,
        work: impl FnOnce(&Tables<'_>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let tx = Transaction::new_unchecked(self.conn, behavior)?;
        let value = work(&Tables::over(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    /// Draws an id that is not currently in use.
    fn fresh_id(&self, in_use: impl FnOnce(Uuid) -> ServiceResult<bool>) -> ServiceResult<Uuid> {
        let id = self.ids.next_id();
        if in_use(id)? {
            return Err(ServiceError::InconsistentState(format!(
                "identifier generator returned live id {id}"
            )));
        }
        Ok(id)
    }
}

fn cascade_discount_codes(tables: &Tables<'_>, store_id: StoreId) -> RepoResult<usize> {
    let owned = tables.codes_of(store_id)?;
    for code in &owned {
        tables.codes.remove(code.id)?;
    }
    Ok(owned.len())
}

/// Runs one public operation and emits its outcome event.
///
/// Caller errors are logged by kind only; their messages may carry payload
/// text.
fn observed<T>(event: &'static str, op: impl FnOnce() -> ServiceResult<T>) -> ServiceResult<T> {
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();

    match &result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) if err.kind().is_caller_error() => info!(
            "event={event} module=service status=rejected error_kind={} duration_ms={duration_ms}",
            err.kind()
        ),
        Err(err) => error!(
            "event={event} module=service status=error error_kind={} duration_ms={duration_ms} error={err}",
            err.kind()
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServiceError};
    use crate::model::validate::InputError;
    use uuid::Uuid;

    #[test]
    fn input_errors_map_to_matching_kinds() {
        let invalid: ServiceError = InputError::InvalidIdentifier("x".to_string()).into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidIdentifier);

        let missing: ServiceError = InputError::MissingField("title").into();
        assert_eq!(missing.kind(), ErrorKind::ValidationError);
        assert_eq!(missing.to_string(), "the store title is required");
    }

    #[test]
    fn not_found_variants_share_one_kind() {
        assert_eq!(
            ServiceError::StoreNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::DiscountCodeNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert!(ErrorKind::NotFound.is_caller_error());
        assert!(!ErrorKind::CascadeFailure.is_caller_error());
    }
}
