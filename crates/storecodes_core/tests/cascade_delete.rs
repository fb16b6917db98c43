mod common;

use common::{code_rows_for, manager};
use storecodes_core::db::open_db_in_memory;
use storecodes_core::{DiscountCodePayload, ErrorKind, ServiceError, StorePayload};

#[test]
fn delete_store_removes_store_and_all_of_its_codes() {
    let conn = open_db_in_memory().unwrap();
    let ledger = manager(&conn);
    let doomed = ledger.add_store(&StorePayload::new("Doomed")).unwrap();
    let kept = ledger.add_store(&StorePayload::new("Kept")).unwrap();
    let doomed_id = doomed.id.to_string();

    let mut doomed_codes = Vec::new();
    for n in 0..3 {
        let code = ledger
            .add_store_discount_code(&doomed_id, &DiscountCodePayload::new(format!("D{n}")))
            .unwrap();
        doomed_codes.push(code.id);
    }
    let kept_code = ledger
        .add_store_discount_code(&kept.id.to_string(), &DiscountCodePayload::new("K"))
        .unwrap();

    let removed = ledger.delete_store(&doomed_id).unwrap();
    assert_eq!(removed.id, doomed.id);
    assert_eq!(removed.code_count, 3);

    assert_eq!(ledger.get_store(&doomed_id).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        ledger.list_store_discount_codes(&doomed_id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    for code_id in doomed_codes {
        let err = ledger.delete_discount(&code_id.to_string()).unwrap_err();
        assert!(matches!(err, ServiceError::DiscountCodeNotFound(id) if id == code_id));
    }
    assert_eq!(code_rows_for(&conn, doomed.id), 0);

    assert_eq!(
        ledger.list_store_discount_codes(&kept.id.to_string()).unwrap(),
        vec![kept_code]
    );
    assert!(ledger.verify_invariants().unwrap().is_empty());
}

#[test]
fn delete_store_without_codes() {
    let conn = open_db_in_memory().unwrap();
    let ledger = manager(&conn);
    let store = ledger.add_store(&StorePayload::new("Empty")).unwrap();

    assert_eq!(ledger.delete_store(&store.id.to_string()).unwrap(), store);
    assert!(ledger.list_stores().unwrap().is_empty());
}

#[test]
fn failed_cascade_keeps_store_and_codes() {
    let conn = open_db_in_memory().unwrap();
    let ledger = manager(&conn);
    let store = ledger.add_store(&StorePayload::new("Locked")).unwrap();
    let store_id = store.id.to_string();
    for value in ["A", "B"] {
        ledger
            .add_store_discount_code(&store_id, &DiscountCodePayload::new(value))
            .unwrap();
    }

    // Fail the second code removal so the first one has already happened
    // inside the transaction when the cascade aborts.
    conn.execute_batch(
        "CREATE TABLE deletions (n INTEGER);
         CREATE TRIGGER block_second_code_delete
         BEFORE DELETE ON discount_codes
         BEGIN
             INSERT INTO deletions VALUES (1);
             SELECT RAISE(ABORT, 'discount codes are locked')
             WHERE (SELECT COUNT(*) FROM deletions) > 1;
         END;",
    )
    .unwrap();

    let err = ledger.delete_store(&store_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CascadeFailure);
    assert!(matches!(err, ServiceError::CascadeFailure { store_id: id, .. } if id == store.id));

    let still_there = ledger.get_store(&store_id).unwrap();
    assert_eq!(still_there.code_count, 2);
    assert_eq!(ledger.list_store_discount_codes(&store_id).unwrap().len(), 2);
    assert_eq!(code_rows_for(&conn, store.id), 2);

    conn.execute_batch("DROP TRIGGER block_second_code_delete;")
        .unwrap();
    ledger.delete_store(&store_id).unwrap();
    assert_eq!(code_rows_for(&conn, store.id), 0);
}
