//! In-memory column store.
//!
//! Behaves like a single-replica wide-column store for the primitives the
//! journal uses: byte-ordered columns per row, last-write-wins on the write
//! timestamp (tombstones included), and TTL expiry. It also records every
//! call and can be told to fail the next ones, which is what the tests lean on.

use crate::column::{Column, ColumnStore, RowColumns, StoreFailure};
use calljournal_core::schema::KEYSPACE;
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// A primitive invoked on the mock store, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put {
        table: String,
        keys: Vec<String>,
        columns: BTreeMap<String, String>,
        timestamp: i64,
        ttl: i32,
    },
    GetWithPrefix {
        table: String,
        key: String,
        prefix: String,
    },
    BatchedDelete {
        rows: Vec<RowColumns>,
        timestamp: i64,
    },
}

#[derive(Debug, Clone)]
struct Cell {
    /// `None` is a tombstone.
    value: Option<String>,
    timestamp: i64,
    expires_at: Option<Instant>,
}

impl Cell {
    /// Last-write-wins: the higher timestamp wins; on a tie a tombstone beats
    /// a value and the greater value beats the smaller.
    fn supersedes(&self, existing: &Cell) -> bool {
        match self.timestamp.cmp(&existing.timestamp) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match (&self.value, &existing.value) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(new), Some(old)) => new >= old,
            },
        }
    }

    fn live_value(&self, now: Instant) -> Option<&str> {
        match self.expires_at {
            Some(expiry) if expiry <= now => None,
            _ => self.value.as_deref(),
        }
    }
}

type RowKey = (String, String);

/// In-memory mock column store for testing.
#[derive(Debug)]
pub struct MockColumnStore {
    keyspace: String,
    rows: Arc<RwLock<BTreeMap<RowKey, BTreeMap<String, Cell>>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<VecDeque<StoreFailure>>>,
    clock_offset: Arc<Mutex<Duration>>,
}

impl Default for MockColumnStore {
    fn default() -> Self {
        Self::with_keyspace(KEYSPACE)
    }
}

impl MockColumnStore {
    /// Create a new, empty mock store bound to the journal's keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new, empty mock store bound to `keyspace`.
    pub fn with_keyspace(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            rows: Arc::default(),
            calls: Arc::default(),
            failures: Arc::default(),
            clock_offset: Arc::default(),
        }
    }

    /// Make the next primitive call fail with `failure`. Queued failures are
    /// consumed one per call, in order. The failed call is still recorded.
    pub fn fail_next(&self, failure: StoreFailure) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(failure);
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Forget recorded calls (stored data is kept).
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Write raw columns without going through `put_columns`, e.g. to plant
    /// keys the journal itself would never produce. Not recorded as a call.
    pub fn seed_columns<I, K, V>(&self, table: &str, key: &str, columns: I, timestamp: i64)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if let Ok(mut rows) = self.rows.write() {
            let row = rows.entry((table.to_string(), key.to_string())).or_default();
            for (name, value) in columns {
                row.insert(
                    name.into(),
                    Cell {
                        value: Some(value.into()),
                        timestamp,
                        expires_at: None,
                    },
                );
            }
        }
    }

    /// Live (non-tombstoned, unexpired) columns of a row, in key order.
    pub fn live_columns(&self, table: &str, key: &str) -> Vec<Column> {
        let now = self.now();
        self.rows
            .read()
            .map(|rows| {
                rows.get(&(table.to_string(), key.to_string()))
                    .map(|row| collect_live(row, "", now))
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Move the store's clock forward, expiring TTL'd columns.
    pub fn advance_clock(&self, by: Duration) {
        if let Ok(mut offset) = self.clock_offset.lock() {
            *offset += by;
        }
    }

    fn now(&self) -> Instant {
        let offset = self.clock_offset.lock().map(|o| *o).unwrap_or_default();
        Instant::now() + offset
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreFailure> {
        self.calls
            .lock()
            .map_err(|_| poisoned())?
            .push(call);
        match self.failures.lock().map_err(|_| poisoned())?.pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn apply(&self, table: &str, key: &str, name: &str, cell: Cell) -> Result<(), StoreFailure> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let row = rows.entry((table.to_string(), key.to_string())).or_default();
        match row.get(name) {
            Some(existing) if !cell.supersedes(existing) => {}
            _ => {
                row.insert(name.to_string(), cell);
            }
        }
        Ok(())
    }
}

fn poisoned() -> StoreFailure {
    StoreFailure::Unknown("mock store lock poisoned".to_string())
}

fn collect_live(row: &BTreeMap<String, Cell>, prefix: &str, now: Instant) -> Vec<Column> {
    row.range(prefix.to_string()..)
        .take_while(|(name, _)| name.starts_with(prefix))
        .filter_map(|(name, cell)| cell.live_value(now).map(|v| Column::new(name.clone(), v)))
        .collect()
}

impl ColumnStore for MockColumnStore {
    fn keyspace(&self) -> &str {
        &self.keyspace
    }

    fn put_columns(
        &self,
        table: &str,
        keys: &[String],
        columns: &BTreeMap<String, String>,
        timestamp: i64,
        ttl: i32,
    ) -> Result<(), StoreFailure> {
        self.record(StoreCall::Put {
            table: table.to_string(),
            keys: keys.to_vec(),
            columns: columns.clone(),
            timestamp,
            ttl,
        })?;

        if ttl < 0 {
            return Err(StoreFailure::InvalidRequest(format!("negative ttl {}", ttl)));
        }
        let expires_at = (ttl > 0).then(|| self.now() + Duration::from_secs(ttl as u64));

        for key in keys {
            for (name, value) in columns {
                self.apply(
                    table,
                    key,
                    name,
                    Cell {
                        value: Some(value.clone()),
                        timestamp,
                        expires_at,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn get_columns_with_prefix(
        &self,
        table: &str,
        key: &str,
        prefix: &str,
    ) -> Result<Vec<Column>, StoreFailure> {
        self.record(StoreCall::GetWithPrefix {
            table: table.to_string(),
            key: key.to_string(),
            prefix: prefix.to_string(),
        })?;

        let now = self.now();
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows
            .get(&(table.to_string(), key.to_string()))
            .map(|row| collect_live(row, prefix, now))
            .unwrap_or_default())
    }

    fn batched_delete(&self, rows: &[RowColumns], timestamp: i64) -> Result<(), StoreFailure> {
        self.record(StoreCall::BatchedDelete {
            rows: rows.to_vec(),
            timestamp,
        })?;

        for row in rows {
            for name in row.columns.keys() {
                self.apply(
                    &row.table,
                    &row.key,
                    name,
                    Cell {
                        value: None,
                        timestamp,
                        expires_at: None,
                    },
                )?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
