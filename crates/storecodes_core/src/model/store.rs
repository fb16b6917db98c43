//! Store record and its write payload.

use super::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Classification applied when a payload carries no usable `type`.
pub const DEFAULT_STORE_TYPE: &str = "E-Commerce";

pub type StoreId = Uuid;

/// Persisted store record.
///
/// Serialized with the ledger's external field names (`type`, `codeCount`,
/// `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    /// Unique among stores at creation time.
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of discount codes whose `store_id` is this store.
    pub code_count: u32,
    pub created_at: Timestamp,
    /// `None` until the first update of any kind.
    pub updated_at: Option<Timestamp>,
}

impl Store {
    /// Builds a fresh store with zero codes and no update timestamp.
    pub(crate) fn create(id: StoreId, title: &str, kind: &str, now: Timestamp) -> Self {
        Self {
            id,
            title: title.to_string(),
            kind: kind.to_string(),
            code_count: 0,
            created_at: now,
            updated_at: None,
        }
    }

    pub(crate) fn touch(&mut self, now: Timestamp) {
        self.updated_at = Some(now);
    }
}

/// Caller input for creating or updating a store.
///
/// Deserialization is lenient: a missing `title` is left for validation to
/// reject, and a `type` that is missing or not a string becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorePayload {
    #[serde(default, deserialize_with = "text_or_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "text_or_none")]
    pub kind: Option<String>,
}

impl StorePayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Returns the supplied `type`, or [`DEFAULT_STORE_TYPE`] when it is
    /// absent or empty.
    pub fn resolved_kind(&self) -> &str {
        self.kind
            .as_deref()
            .filter(|kind| !kind.is_empty())
            .unwrap_or(DEFAULT_STORE_TYPE)
    }
}

/// Accepts a JSON string; any other JSON value (including `null`) maps to
/// `None`.
pub(crate) fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(text) => Some(text),
        Lenient::Other(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{Store, StorePayload, DEFAULT_STORE_TYPE};
    use uuid::Uuid;

    #[test]
    fn payload_type_defaults_when_absent_empty_or_not_a_string() {
        for raw in [
            r#"{"title":"Acme"}"#,
            r#"{"title":"Acme","type":""}"#,
            r#"{"title":"Acme","type":42}"#,
            r#"{"title":"Acme","type":null}"#,
            r#"{"title":"Acme","type":{"nested":true}}"#,
        ] {
            let payload: StorePayload = serde_json::from_str(raw).unwrap();
            assert_eq!(payload.resolved_kind(), DEFAULT_STORE_TYPE, "{raw}");
        }

        let payload: StorePayload =
            serde_json::from_str(r#"{"title":"Acme","type":"Retail"}"#).unwrap();
        assert_eq!(payload.resolved_kind(), "Retail");
    }

    #[test]
    fn payload_without_title_still_decodes() {
        let payload: StorePayload = serde_json::from_str(r#"{"type":"Retail"}"#).unwrap();
        assert_eq!(payload.title, None);
    }

    #[test]
    fn store_serializes_with_external_field_names() {
        let store = Store::create(Uuid::nil(), "Acme", DEFAULT_STORE_TYPE, 7);
        let value = serde_json::to_value(&store).unwrap();
        assert_eq!(value["type"], "E-Commerce");
        assert_eq!(value["codeCount"], 0);
        assert_eq!(value["createdAt"], 7);
        assert!(value["updatedAt"].is_null());
    }
}
