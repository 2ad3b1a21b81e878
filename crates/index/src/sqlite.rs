//! Persistent record store backed by SQLite.
//!
//! Uses a connection pool (r2d2) for concurrent reads and a dedicated writer
//! connection for serialized writes. SQLite WAL mode allows readers to
//! proceed without blocking the writer and vice versa; the writer mutex is
//! the single-writer discipline the ingestion pipeline relies on.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, Bytes, B256, U256};
use parking_lot::{Mutex, MutexGuard};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{IndexError, IndexResult};
use crate::store::RecordStore;
use crate::types::{
    EnqueueEntry, IndexedTransaction, QueueOrigin, StateRootBatch, StateRootEntry, Tier,
    TransactionBatch,
};

/// Persistent record store backed by SQLite.
pub struct PersistentRecordStore {
    /// Connection pool for read operations (concurrent).
    read_pool: Pool<SqliteConnectionManager>,
    /// Dedicated connection for write operations (serialized).
    writer: Mutex<Connection>,
}

/// Configure a connection with standard PRAGMAs for WAL mode.
fn configure_connection(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;",
    )
}

fn unique_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Table holding transactions for a tier.
fn tx_table(tier: Tier) -> &'static str {
    match tier {
        Tier::Confirmed => "transactions",
        Tier::Unconfirmed => "unconfirmed_transactions",
    }
}

/// Table holding state roots for a tier.
fn root_table(tier: Tier) -> &'static str {
    match tier {
        Tier::Confirmed => "state_roots",
        Tier::Unconfirmed => "unconfirmed_state_roots",
    }
}

fn b256_from_blob(bytes: &[u8], col: usize) -> rusqlite::Result<B256> {
    if bytes.len() == 32 {
        Ok(B256::from_slice(bytes))
    } else {
        Err(rusqlite::Error::InvalidColumnType(
            col,
            "B256".to_string(),
            rusqlite::types::Type::Blob,
        ))
    }
}

fn address_from_blob(bytes: &[u8], col: usize) -> rusqlite::Result<Address> {
    if bytes.len() == 20 {
        Ok(Address::from_slice(bytes))
    } else {
        Err(rusqlite::Error::InvalidColumnType(
            col,
            "Address".to_string(),
            rusqlite::types::Type::Blob,
        ))
    }
}

fn queue_origin_from_str(s: &str, col: usize) -> rusqlite::Result<QueueOrigin> {
    match s {
        "sequencer" => Ok(QueueOrigin::Sequencer),
        "l1" => Ok(QueueOrigin::L1),
        _ => Err(rusqlite::Error::InvalidColumnType(
            col,
            "QueueOrigin".to_string(),
            rusqlite::types::Type::Text,
        )),
    }
}

fn queue_origin_str(origin: QueueOrigin) -> &'static str {
    match origin {
        QueueOrigin::Sequencer => "sequencer",
        QueueOrigin::L1 => "l1",
    }
}

impl PersistentRecordStore {
    /// Create a new record store backed by an on-disk SQLite database.
    pub fn new(db_path: impl AsRef<std::path::Path>) -> IndexResult<Self> {
        // Writer connection -- dedicated for insert operations
        let writer = Connection::open(&db_path)?;
        configure_connection(&writer)?;

        // Read pool -- concurrent read-only connections
        let manager = SqliteConnectionManager::file(&db_path)
            .with_flags(
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_init(|conn| configure_connection(conn));
        let read_pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| IndexError::Sqlite(e.to_string()))?;

        let store = Self {
            read_pool,
            writer: Mutex::new(writer),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory record store for testing.
    ///
    /// In-memory SQLite DBs are per-connection, so tests use a named
    /// shared-cache URI visible to both the writer and the read pool.
    pub fn in_memory() -> IndexResult<Self> {
        let uri = format!("file:ferry_test_{}?mode=memory&cache=shared", unique_id());
        let writer = Connection::open(&uri)?;
        configure_connection(&writer)?;

        let manager =
            SqliteConnectionManager::file(&uri).with_init(|conn| configure_connection(conn));
        let read_pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(|e| IndexError::Sqlite(e.to_string()))?;

        let store = Self {
            read_pool,
            writer: Mutex::new(writer),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn read_conn(&self) -> IndexResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.read_pool
            .get()
            .map_err(|e| IndexError::Sqlite(e.to_string()))
    }

    fn write_conn(&self) -> MutexGuard<'_, Connection> {
        self.writer.lock()
    }

    fn init_schema(&self) -> IndexResult<()> {
        let conn = self.write_conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS enqueue (
                 idx INTEGER PRIMARY KEY,
                 target BLOB NOT NULL,
                 data BLOB NOT NULL,
                 gas_limit INTEGER NOT NULL,
                 origin BLOB NOT NULL,
                 block_number INTEGER NOT NULL,
                 timestamp INTEGER NOT NULL
             );

             CREATE TABLE IF NOT EXISTS queue_ctc (
                 queue_index INTEGER PRIMARY KEY,
                 ctc_index INTEGER NOT NULL
             );

             CREATE TABLE IF NOT EXISTS transactions (
                 idx INTEGER PRIMARY KEY,
                 batch_index INTEGER,
                 block_number INTEGER NOT NULL,
                 timestamp INTEGER NOT NULL,
                 gas_limit INTEGER NOT NULL,
                 target BLOB NOT NULL,
                 origin BLOB,
                 data BLOB NOT NULL,
                 queue_origin TEXT NOT NULL,
                 queue_index INTEGER,
                 value BLOB NOT NULL
             );
             CREATE TABLE IF NOT EXISTS unconfirmed_transactions (
                 idx INTEGER PRIMARY KEY,
                 batch_index INTEGER,
                 block_number INTEGER NOT NULL,
                 timestamp INTEGER NOT NULL,
                 gas_limit INTEGER NOT NULL,
                 target BLOB NOT NULL,
                 origin BLOB,
                 data BLOB NOT NULL,
                 queue_origin TEXT NOT NULL,
                 queue_index INTEGER,
                 value BLOB NOT NULL
             );

             CREATE TABLE IF NOT EXISTS transaction_batches (
                 idx INTEGER PRIMARY KEY,
                 block_number INTEGER NOT NULL,
                 timestamp INTEGER NOT NULL,
                 submitter BLOB NOT NULL,
                 size INTEGER NOT NULL,
                 prev_total_elements INTEGER NOT NULL,
                 root BLOB NOT NULL,
                 extra_data BLOB NOT NULL
             );

             CREATE TABLE IF NOT EXISTS state_roots (
                 idx INTEGER PRIMARY KEY,
                 batch_index INTEGER,
                 value BLOB NOT NULL
             );
             CREATE TABLE IF NOT EXISTS unconfirmed_state_roots (
                 idx INTEGER PRIMARY KEY,
                 batch_index INTEGER,
                 value BLOB NOT NULL
             );

             CREATE TABLE IF NOT EXISTS state_root_batches (
                 idx INTEGER PRIMARY KEY,
                 block_number INTEGER NOT NULL,
                 timestamp INTEGER NOT NULL,
                 submitter BLOB NOT NULL,
                 size INTEGER NOT NULL,
                 prev_total_elements INTEGER NOT NULL,
                 root BLOB NOT NULL,
                 extra_data BLOB NOT NULL
             );

             CREATE TABLE IF NOT EXISTS metadata (
                 key TEXT PRIMARY KEY,
                 value INTEGER NOT NULL
             );",
        )?;
        tracing::debug!("record store schema initialized");
        Ok(())
    }

    fn row_to_enqueue(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnqueueEntry> {
        let index: i64 = row.get(0)?;
        let target: Vec<u8> = row.get(1)?;
        let data: Vec<u8> = row.get(2)?;
        let gas_limit: i64 = row.get(3)?;
        let origin: Vec<u8> = row.get(4)?;
        let block_number: i64 = row.get(5)?;
        let timestamp: i64 = row.get(6)?;

        Ok(EnqueueEntry {
            index: index as u64,
            target: address_from_blob(&target, 1)?,
            data: Bytes::from(data),
            gas_limit: gas_limit as u64,
            origin: address_from_blob(&origin, 4)?,
            block_number: block_number as u64,
            timestamp: timestamp as u64,
            ctc_index: None,
        })
    }

    fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedTransaction> {
        let index: i64 = row.get(0)?;
        let batch_index: Option<i64> = row.get(1)?;
        let block_number: i64 = row.get(2)?;
        let timestamp: i64 = row.get(3)?;
        let gas_limit: i64 = row.get(4)?;
        let target: Vec<u8> = row.get(5)?;
        let origin: Option<Vec<u8>> = row.get(6)?;
        let data: Vec<u8> = row.get(7)?;
        let queue_origin: String = row.get(8)?;
        let queue_index: Option<i64> = row.get(9)?;
        let value: Vec<u8> = row.get(10)?;

        let origin = origin
            .as_deref()
            .map(|b| address_from_blob(b, 6))
            .transpose()?;

        Ok(IndexedTransaction {
            index: index as u64,
            batch_index: batch_index.map(|i| i as u64),
            block_number: block_number as u64,
            timestamp: timestamp as u64,
            gas_limit: gas_limit as u64,
            target: address_from_blob(&target, 5)?,
            origin,
            data: Bytes::from(data),
            queue_origin: queue_origin_from_str(&queue_origin, 8)?,
            queue_index: queue_index.map(|i| i as u64),
            value: U256::from_be_slice(&value),
        })
    }

    fn row_to_transaction_batch(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionBatch> {
        let index: i64 = row.get(0)?;
        let block_number: i64 = row.get(1)?;
        let timestamp: i64 = row.get(2)?;
        let submitter: Vec<u8> = row.get(3)?;
        let size: i64 = row.get(4)?;
        let prev_total_elements: i64 = row.get(5)?;
        let root: Vec<u8> = row.get(6)?;
        let extra_data: Vec<u8> = row.get(7)?;

        Ok(TransactionBatch {
            index: index as u64,
            block_number: block_number as u64,
            timestamp: timestamp as u64,
            submitter: address_from_blob(&submitter, 3)?,
            size: size as u64,
            prev_total_elements: prev_total_elements as u64,
            root: b256_from_blob(&root, 6)?,
            extra_data: Bytes::from(extra_data),
        })
    }

    fn row_to_state_root(row: &rusqlite::Row<'_>) -> rusqlite::Result<StateRootEntry> {
        let index: i64 = row.get(0)?;
        let batch_index: Option<i64> = row.get(1)?;
        let value: Vec<u8> = row.get(2)?;

        Ok(StateRootEntry {
            index: index as u64,
            batch_index: batch_index.map(|i| i as u64),
            value: b256_from_blob(&value, 2)?,
        })
    }

    fn row_to_state_root_batch(row: &rusqlite::Row<'_>) -> rusqlite::Result<StateRootBatch> {
        let index: i64 = row.get(0)?;
        let block_number: i64 = row.get(1)?;
        let timestamp: i64 = row.get(2)?;
        let submitter: Vec<u8> = row.get(3)?;
        let size: i64 = row.get(4)?;
        let prev_total_elements: i64 = row.get(5)?;
        let root: Vec<u8> = row.get(6)?;
        let extra_data: Vec<u8> = row.get(7)?;

        Ok(StateRootBatch {
            index: index as u64,
            block_number: block_number as u64,
            timestamp: timestamp as u64,
            submitter: address_from_blob(&submitter, 3)?,
            size: size as u64,
            prev_total_elements: prev_total_elements as u64,
            root: b256_from_blob(&root, 6)?,
            extra_data: Bytes::from(extra_data),
        })
    }

    /// Write-once assignment of a queue element's canonical-chain position.
    /// Must be called with the writer lock held.
    fn set_ctc_index_locked(
        conn: &Connection,
        queue_index: u64,
        ctc_index: u64,
    ) -> IndexResult<()> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT ctc_index FROM queue_ctc WHERE queue_index = ?",
                params![queue_index as i64],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            None => {
                conn.execute(
                    "INSERT OR IGNORE INTO queue_ctc (queue_index, ctc_index) VALUES (?, ?)",
                    params![queue_index as i64, ctc_index as i64],
                )?;
                Ok(())
            }
            Some(v) if v as u64 == ctc_index => Ok(()),
            Some(_) => Err(IndexError::CtcIndexAlreadySet(queue_index)),
        }
    }
}

impl RecordStore for PersistentRecordStore {
    fn enqueue_by_index(&self, index: u64) -> IndexResult<Option<EnqueueEntry>> {
        let conn = self.read_conn()?;
        let entry = conn
            .query_row(
                "SELECT idx, target, data, gas_limit, origin, block_number, timestamp
                 FROM enqueue WHERE idx = ?",
                params![index as i64],
                Self::row_to_enqueue,
            )
            .optional()?;
        Ok(entry)
    }

    fn latest_enqueue(&self) -> IndexResult<Option<EnqueueEntry>> {
        let conn = self.read_conn()?;
        let entry = conn
            .query_row(
                "SELECT idx, target, data, gas_limit, origin, block_number, timestamp
                 FROM enqueue ORDER BY idx DESC LIMIT 1",
                [],
                Self::row_to_enqueue,
            )
            .optional()?;
        Ok(entry)
    }

    fn transaction_index_by_queue_index(&self, queue_index: u64) -> IndexResult<Option<u64>> {
        let conn = self.read_conn()?;
        let ctc: Option<i64> = conn
            .query_row(
                "SELECT ctc_index FROM queue_ctc WHERE queue_index = ?",
                params![queue_index as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ctc.map(|v| v as u64))
    }

    fn put_enqueue_entries(&self, entries: &[EnqueueEntry]) -> IndexResult<()> {
        let mut conn = self.write_conn();
        let tx = conn.transaction()?;
        for entry in entries {
            tx.execute(
                "INSERT OR IGNORE INTO enqueue
                 (idx, target, data, gas_limit, origin, block_number, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.index as i64,
                    entry.target.as_slice(),
                    entry.data.as_ref(),
                    entry.gas_limit as i64,
                    entry.origin.as_slice(),
                    entry.block_number as i64,
                    entry.timestamp as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn set_ctc_index(&self, queue_index: u64, ctc_index: u64) -> IndexResult<()> {
        let conn = self.write_conn();
        Self::set_ctc_index_locked(&conn, queue_index, ctc_index)
    }

    fn transaction_by_index(
        &self,
        tier: Tier,
        index: u64,
    ) -> IndexResult<Option<IndexedTransaction>> {
        let conn = self.read_conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT idx, batch_index, block_number, timestamp, gas_limit, target,
                            origin, data, queue_origin, queue_index, value
                     FROM {} WHERE idx = ?",
                    tx_table(tier)
                ),
                params![index as i64],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    fn latest_transaction(&self, tier: Tier) -> IndexResult<Option<IndexedTransaction>> {
        let conn = self.read_conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT idx, batch_index, block_number, timestamp, gas_limit, target,
                            origin, data, queue_origin, queue_index, value
                     FROM {} ORDER BY idx DESC LIMIT 1",
                    tx_table(tier)
                ),
                [],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    fn transaction_range(
        &self,
        tier: Tier,
        lo: u64,
        hi: u64,
    ) -> IndexResult<Vec<IndexedTransaction>> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT idx, batch_index, block_number, timestamp, gas_limit, target,
                    origin, data, queue_origin, queue_index, value
             FROM {} WHERE idx >= ? AND idx < ? ORDER BY idx ASC",
            tx_table(tier)
        ))?;
        let rows = stmt.query_map(params![lo as i64, hi as i64], Self::row_to_transaction)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn put_transactions(&self, tier: Tier, txs: &[IndexedTransaction]) -> IndexResult<()> {
        let mut conn = self.write_conn();
        let sql = format!(
            "INSERT OR IGNORE INTO {}
             (idx, batch_index, block_number, timestamp, gas_limit, target,
              origin, data, queue_origin, queue_index, value)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            tx_table(tier)
        );
        let db_tx = conn.transaction()?;
        for tx in txs {
            db_tx.execute(
                &sql,
                params![
                    tx.index as i64,
                    tx.batch_index.map(|i| i as i64),
                    tx.block_number as i64,
                    tx.timestamp as i64,
                    tx.gas_limit as i64,
                    tx.target.as_slice(),
                    tx.origin.as_ref().map(|a| a.as_slice().to_vec()),
                    tx.data.as_ref(),
                    queue_origin_str(tx.queue_origin),
                    tx.queue_index.map(|i| i as i64),
                    tx.value.to_be_bytes::<32>().to_vec(),
                ],
            )?;
            // Confirmed queue-origin transactions pin the canonical position
            // of their queue element.
            if tier == Tier::Confirmed {
                if let (QueueOrigin::L1, Some(queue_index)) = (tx.queue_origin, tx.queue_index) {
                    Self::set_ctc_index_locked(&db_tx, queue_index, tx.index)?;
                }
            }
        }
        db_tx.commit()?;
        Ok(())
    }

    fn transaction_batch_by_index(&self, index: u64) -> IndexResult<Option<TransactionBatch>> {
        let conn = self.read_conn()?;
        let batch = conn
            .query_row(
                "SELECT idx, block_number, timestamp, submitter, size, prev_total_elements,
                        root, extra_data
                 FROM transaction_batches WHERE idx = ?",
                params![index as i64],
                Self::row_to_transaction_batch,
            )
            .optional()?;
        Ok(batch)
    }

    fn latest_transaction_batch(&self) -> IndexResult<Option<TransactionBatch>> {
        let conn = self.read_conn()?;
        let batch = conn
            .query_row(
                "SELECT idx, block_number, timestamp, submitter, size, prev_total_elements,
                        root, extra_data
                 FROM transaction_batches ORDER BY idx DESC LIMIT 1",
                [],
                Self::row_to_transaction_batch,
            )
            .optional()?;
        Ok(batch)
    }

    fn put_transaction_batches(&self, batches: &[TransactionBatch]) -> IndexResult<()> {
        let mut conn = self.write_conn();
        let tx = conn.transaction()?;
        for batch in batches {
            tx.execute(
                "INSERT OR IGNORE INTO transaction_batches
                 (idx, block_number, timestamp, submitter, size, prev_total_elements,
                  root, extra_data)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    batch.index as i64,
                    batch.block_number as i64,
                    batch.timestamp as i64,
                    batch.submitter.as_slice(),
                    batch.size as i64,
                    batch.prev_total_elements as i64,
                    batch.root.as_slice(),
                    batch.extra_data.as_ref(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn state_root_by_index(&self, tier: Tier, index: u64) -> IndexResult<Option<StateRootEntry>> {
        let conn = self.read_conn()?;
        let root = conn
            .query_row(
                &format!(
                    "SELECT idx, batch_index, value FROM {} WHERE idx = ?",
                    root_table(tier)
                ),
                params![index as i64],
                Self::row_to_state_root,
            )
            .optional()?;
        Ok(root)
    }

    fn latest_state_root(&self, tier: Tier) -> IndexResult<Option<StateRootEntry>> {
        let conn = self.read_conn()?;
        let root = conn
            .query_row(
                &format!(
                    "SELECT idx, batch_index, value FROM {} ORDER BY idx DESC LIMIT 1",
                    root_table(tier)
                ),
                [],
                Self::row_to_state_root,
            )
            .optional()?;
        Ok(root)
    }

    fn state_root_range(
        &self,
        tier: Tier,
        lo: u64,
        hi: u64,
    ) -> IndexResult<Vec<StateRootEntry>> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT idx, batch_index, value FROM {} WHERE idx >= ? AND idx < ? ORDER BY idx ASC",
            root_table(tier)
        ))?;
        let rows = stmt.query_map(params![lo as i64, hi as i64], Self::row_to_state_root)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn put_state_roots(&self, tier: Tier, roots: &[StateRootEntry]) -> IndexResult<()> {
        let mut conn = self.write_conn();
        let sql = format!(
            "INSERT OR IGNORE INTO {} (idx, batch_index, value) VALUES (?, ?, ?)",
            root_table(tier)
        );
        let tx = conn.transaction()?;
        for root in roots {
            tx.execute(
                &sql,
                params![
                    root.index as i64,
                    root.batch_index.map(|i| i as i64),
                    root.value.as_slice(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn state_root_batch_by_index(&self, index: u64) -> IndexResult<Option<StateRootBatch>> {
        let conn = self.read_conn()?;
        let batch = conn
            .query_row(
                "SELECT idx, block_number, timestamp, submitter, size, prev_total_elements,
                        root, extra_data
                 FROM state_root_batches WHERE idx = ?",
                params![index as i64],
                Self::row_to_state_root_batch,
            )
            .optional()?;
        Ok(batch)
    }

    fn latest_state_root_batch(&self) -> IndexResult<Option<StateRootBatch>> {
        let conn = self.read_conn()?;
        let batch = conn
            .query_row(
                "SELECT idx, block_number, timestamp, submitter, size, prev_total_elements,
                        root, extra_data
                 FROM state_root_batches ORDER BY idx DESC LIMIT 1",
                [],
                Self::row_to_state_root_batch,
            )
            .optional()?;
        Ok(batch)
    }

    fn put_state_root_batches(&self, batches: &[StateRootBatch]) -> IndexResult<()> {
        let mut conn = self.write_conn();
        let tx = conn.transaction()?;
        for batch in batches {
            tx.execute(
                "INSERT OR IGNORE INTO state_root_batches
                 (idx, block_number, timestamp, submitter, size, prev_total_elements,
                  root, extra_data)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    batch.index as i64,
                    batch.block_number as i64,
                    batch.timestamp as i64,
                    batch.submitter.as_slice(),
                    batch.size as i64,
                    batch.prev_total_elements as i64,
                    batch.root.as_slice(),
                    batch.extra_data.as_ref(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn highest_known_index(&self) -> IndexResult<Option<u64>> {
        let conn = self.read_conn()?;
        let value: Option<i64> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'highest_known_index'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.map(|v| v as u64))
    }

    fn set_highest_known_index(&self, index: u64) -> IndexResult<()> {
        let conn = self.write_conn();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('highest_known_index', ?1)
             ON CONFLICT(key) DO UPDATE SET value = ?1 WHERE ?1 > metadata.value",
            params![index as i64],
        )?;
        Ok(())
    }
}
