//! Read-only consistency audit over both record collections.

use crate::model::discount_code::{DiscountCode, DiscountCodeId};
use crate::model::store::{Store, StoreId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// One breach of a ledger invariant found by an audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Stored `code_count` disagrees with the codes that reference the store.
    CountMismatch {
        store_id: StoreId,
        recorded: u32,
        actual: usize,
    },
    /// Code references a store that no longer exists.
    OrphanedCode {
        code_id: DiscountCodeId,
        store_id: StoreId,
    },
    /// Several stores share one title. Reachable through `update_store`.
    DuplicateTitle {
        title: String,
        store_ids: Vec<StoreId>,
    },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch {
                store_id,
                recorded,
                actual,
            } => write!(
                f,
                "store {store_id} records {recorded} codes but {actual} reference it"
            ),
            Self::OrphanedCode { code_id, store_id } => {
                write!(f, "discount code {code_id} references missing store {store_id}")
            }
            Self::DuplicateTitle { title, store_ids } => {
                write!(f, "title `{title}` is shared by {} stores", store_ids.len())
            }
        }
    }
}

/// Checks the counter, ownership and title invariants over full snapshots of
/// both collections. Violations come out in store order, then code order.
pub fn audit_records(stores: &[Store], codes: &[DiscountCode]) -> Vec<InvariantViolation> {
    let mut referencing: HashMap<StoreId, usize> = HashMap::new();
    for code in codes {
        *referencing.entry(code.store_id).or_default() += 1;
    }

    let mut violations = Vec::new();
    let mut by_title: BTreeMap<&str, Vec<StoreId>> = BTreeMap::new();

    for store in stores {
        let actual = referencing.get(&store.id).copied().unwrap_or(0);
        if usize::try_from(store.code_count).ok() != Some(actual) {
            violations.push(InvariantViolation::CountMismatch {
                store_id: store.id,
                recorded: store.code_count,
                actual,
            });
        }
        by_title.entry(store.title.as_str()).or_default().push(store.id);
    }

    let known: HashSet<StoreId> = stores.iter().map(|store| store.id).collect();
    for code in codes {
        if !known.contains(&code.store_id) {
            violations.push(InvariantViolation::OrphanedCode {
                code_id: code.id,
                store_id: code.store_id,
            });
        }
    }

    violations.extend(
        by_title
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(title, store_ids)| InvariantViolation::DuplicateTitle {
                title: title.to_string(),
                store_ids,
            }),
    );

    violations
}
