//! Generic key -> record mapping over SQLite.
//!
//! Each collection lives in its own table of `(seq, key, body)` rows where
//! `body` is the record's JSON encoding. `seq` is assigned on first insert and
//! kept across overwrites, so [`RecordTable::list`] returns records in stable
//! first-insertion order.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::discount_code::DiscountCode;
use crate::model::store::Store;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of the storage substrate beneath a record table.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Record could not be encoded for storage.
    Encode(serde_json::Error),
    /// Stored row cannot be turned back into a valid record.
    InvalidData(String),
    /// `insert` was called with a key other than the record's own id.
    KeyMismatch {
        table: &'static str,
        key: String,
        record_key: String,
    },
    /// Connection schema is not at the version this binary writes.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode record: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
            Self::KeyMismatch {
                table,
                key,
                record_key,
            } => write!(
                f,
                "refusing to store record `{record_key}` under key `{key}` in `{table}`"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record tables require schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record tables require table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_)
            | Self::KeyMismatch { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A value that can live in a [`SqliteRecordTable`].
pub trait Record: Serialize + DeserializeOwned {
    /// Backing table name. Must be created by a migration.
    const TABLE: &'static str;

    /// The record's own primary key.
    fn key(&self) -> Uuid;
}

impl Record for Store {
    const TABLE: &'static str = "stores";

    fn key(&self) -> Uuid {
        self.id
    }
}

impl Record for DiscountCode {
    const TABLE: &'static str = "discount_codes";

    fn key(&self) -> Uuid {
        self.id
    }
}

/// Durable mapping from a unique key to a record value.
pub trait RecordTable<K, V> {
    /// Loads one record, if present.
    fn get(&self, key: K) -> RepoResult<Option<V>>;
    /// Stores `value` under `key`, returning the record it replaced.
    fn insert(&self, key: K, value: &V) -> RepoResult<Option<V>>;
    /// Deletes one record, returning it if it was present.
    fn remove(&self, key: K) -> RepoResult<Option<V>>;
    /// Returns every record in first-insertion order.
    fn list(&self) -> RepoResult<Vec<V>>;
}

/// SQLite-backed record table.
///
/// Borrows a connection (or an open transaction, via deref) so that several
/// tables can take part in the same atomic unit of work.
pub struct SqliteRecordTable<'conn, V> {
    conn: &'conn Connection,
    _record: PhantomData<fn() -> V>,
}

impl<'conn, V: Record> SqliteRecordTable<'conn, V> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }
}

impl<V: Record> RecordTable<Uuid, V> for SqliteRecordTable<'_, V> {
    fn get(&self, key: Uuid) -> RepoResult<Option<V>> {
        let key_text = key.to_string();
        let body: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT body FROM {} WHERE key = ?1;", V::TABLE),
                [key_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| decode_record(&key_text, &body)).transpose()
    }

    fn insert(&self, key: Uuid, value: &V) -> RepoResult<Option<V>> {
        if value.key() != key {
            return Err(RepoError::KeyMismatch {
                table: V::TABLE,
                key: key.to_string(),
                record_key: value.key().to_string(),
            });
        }

        let previous = self.get(key)?;
        let body = serde_json::to_string(value).map_err(RepoError::Encode)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {} (key, body) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET body = excluded.body;",
                V::TABLE
            ),
            params![key.to_string(), body],
        )?;

        Ok(previous)
    }

    fn remove(&self, key: Uuid) -> RepoResult<Option<V>> {
        let Some(previous) = self.get(key)? else {
            return Ok(None);
        };

        self.conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1;", V::TABLE),
            [key.to_string()],
        )?;
        Ok(Some(previous))
    }

    fn list(&self) -> RepoResult<Vec<V>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT key, body FROM {} ORDER BY seq ASC;", V::TABLE))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let key_text: String = row.get(0)?;
            let body: String = row.get(1)?;
            records.push(decode_record(&key_text, &body)?);
        }

        Ok(records)
    }
}

/// Checks that `conn` is migrated and carries both record tables.
pub fn ensure_tables_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in [Store::TABLE, DiscountCode::TABLE] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn decode_record<V: Record>(key_text: &str, body: &str) -> RepoResult<V> {
    let record: V = serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!(
            "undecodable body for key `{key_text}` in {}: {err}",
            V::TABLE
        ))
    })?;

    if record.key().to_string() != key_text {
        return Err(RepoError::InvalidData(format!(
            "row key `{key_text}` in {} holds record `{}`",
            V::TABLE,
            record.key()
        )));
    }

    Ok(record)
}
