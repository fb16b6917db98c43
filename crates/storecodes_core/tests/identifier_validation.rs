mod common;

use common::manager;
use storecodes_core::db::open_db_in_memory;
use storecodes_core::{DiscountCodePayload, ErrorKind, ServiceError, StorePayload};

const MALFORMED: &[&str] = &[
    "not-a-uuid",
    "",
    "12345",
    "00000000000000000000000000000001",
    "{00000000-0000-0000-0000-000000000001}",
    "00000000-0000-0000-0000-00000000000Z",
    "00000000-0000-0000-0000-000000000001",
    "5f0c6a4e-8d3b-7c1a-0f2e-0b7d6c5a4e3f",
    "5f0c6a4e-8d3b-fc1a-cf2e-0b7d6c5a4e3f",
];

#[test]
fn malformed_identifiers_are_rejected_without_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let ledger = manager(&conn);

    // Any storage access after this point would fail with a storage error.
    conn.execute_batch("DROP TABLE stores; DROP TABLE discount_codes;")
        .unwrap();

    for raw in MALFORMED {
        let results = [
            ledger.get_store(raw).map(drop),
            ledger.update_store(raw, &StorePayload::new("x")).map(drop),
            ledger.delete_store(raw).map(drop),
            ledger.list_store_discount_codes(raw).map(drop),
            ledger
                .add_store_discount_code(raw, &DiscountCodePayload::new("x"))
                .map(drop),
            ledger.delete_discount(raw).map(drop),
            ledger.get_discount_code(raw).map(drop),
        ];
        for result in results {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidIdentifier, "`{raw}`");
            assert!(matches!(err, ServiceError::InvalidIdentifier(ref echoed) if echoed == raw));
        }
    }
}

#[test]
fn uppercase_canonical_identifier_finds_the_record() {
    let conn = open_db_in_memory().unwrap();
    let ledger = manager(&conn);
    let store = ledger.add_store(&StorePayload::new("Acme")).unwrap();

    let upper = store.id.to_string().to_uppercase();
    assert_eq!(ledger.get_store(&upper).unwrap(), store);
}
