//! Discount code record and its write payload.

use super::store::{text_or_none, StoreId};
use super::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DiscountCodeId = Uuid;

/// Persisted discount code owned by exactly one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: DiscountCodeId,
    /// Owner at creation time. Not re-validated afterwards.
    pub store_id: StoreId,
    /// Opaque code text handed to shoppers.
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl DiscountCode {
    pub(crate) fn create(
        id: DiscountCodeId,
        store_id: StoreId,
        payload: &DiscountCodePayload,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            store_id,
            value: payload.value.clone().unwrap_or_default(),
            created_at: now,
            updated_at: Some(now),
        }
    }
}

/// Caller input for creating a discount code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscountCodePayload {
    #[serde(default, deserialize_with = "text_or_none")]
    pub value: Option<String>,
}

impl DiscountCodePayload {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }
}
