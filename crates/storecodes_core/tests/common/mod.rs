#![allow(dead_code)]

use rusqlite::Connection;
use std::cell::Cell;
use storecodes_core::{Clock, ConsistencyManager, IdGenerator, Timestamp};
use uuid::{Builder, Uuid};

/// Clock that advances by one millisecond on every read, starting at 1000.
#[derive(Default)]
pub struct StepClock {
    ticks: Cell<Timestamp>,
}

impl Clock for StepClock {
    fn now_ms(&self) -> Timestamp {
        let next = self.ticks.get() + 1;
        self.ticks.set(next);
        1000 + next
    }
}

/// Version-4 shaped id whose low bytes carry `n`.
pub fn seq_id(n: u128) -> Uuid {
    Builder::from_random_bytes(n.to_be_bytes()).into_uuid()
}

/// Ids `seq_id(1)`, `seq_id(2)`, ... in allocation order.
#[derive(Default)]
pub struct SequentialIds {
    next: Cell<u128>,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let next = self.next.get() + 1;
        self.next.set(next);
        seq_id(next)
    }
}

pub type TestManager<'conn> = ConsistencyManager<'conn, StepClock, SequentialIds>;

pub fn manager(conn: &Connection) -> TestManager<'_> {
    ConsistencyManager::with_providers(conn, StepClock::default(), SequentialIds::default())
        .unwrap()
}

pub fn code_rows_for(conn: &Connection, store_id: Uuid) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM discount_codes WHERE json_extract(body, '$.storeId') = ?1;",
        [store_id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
