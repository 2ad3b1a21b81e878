//! Record store contract.
//!
//! The store is append-only and index-addressable: point lookups by index,
//! "latest" lookups, and index-range scans, per record kind and tier.
//! All methods are synchronous to avoid Send bound issues with the storage
//! layer; read paths are safe to call concurrently with writes.

use crate::error::IndexResult;
use crate::types::{
    EnqueueEntry, IndexedTransaction, StateRootBatch, StateRootEntry, Tier, TransactionBatch,
};

/// Index-addressable storage for the five record kinds.
///
/// Insert operations are idempotent with respect to index: re-storing a
/// record at an already-present index is a no-op, never an overwrite. This
/// keeps the write-once `ctc_index` rule enforceable.
pub trait RecordStore: Send + Sync {
    // --- enqueue entries (confirmed only) ---

    /// Get an enqueue entry by queue index.
    fn enqueue_by_index(&self, index: u64) -> IndexResult<Option<EnqueueEntry>>;

    /// Get the enqueue entry with the highest index.
    fn latest_enqueue(&self) -> IndexResult<Option<EnqueueEntry>>;

    /// Position the enqueued element occupies in the canonical transaction
    /// chain, if already known.
    fn transaction_index_by_queue_index(&self, queue_index: u64) -> IndexResult<Option<u64>>;

    /// Insert enqueue entries. Existing indices are left untouched.
    fn put_enqueue_entries(&self, entries: &[EnqueueEntry]) -> IndexResult<()>;

    /// Record the canonical-chain position of a queue element. Write-once:
    /// assigning a different value to an already-enriched element is an
    /// error, re-assigning the same value is a no-op.
    fn set_ctc_index(&self, queue_index: u64, ctc_index: u64) -> IndexResult<()>;

    // --- transactions (tiered) ---

    /// Get a transaction by index within a tier.
    fn transaction_by_index(
        &self,
        tier: Tier,
        index: u64,
    ) -> IndexResult<Option<IndexedTransaction>>;

    /// Get the highest-index transaction within a tier.
    fn latest_transaction(&self, tier: Tier) -> IndexResult<Option<IndexedTransaction>>;

    /// Scan transactions in `[lo, hi)` within a tier, in index order.
    fn transaction_range(
        &self,
        tier: Tier,
        lo: u64,
        hi: u64,
    ) -> IndexResult<Vec<IndexedTransaction>>;

    /// Insert transactions into a tier. Existing indices are left untouched.
    fn put_transactions(&self, tier: Tier, txs: &[IndexedTransaction]) -> IndexResult<()>;

    // --- transaction batches (confirmed only) ---

    /// Get a transaction batch by index.
    fn transaction_batch_by_index(&self, index: u64) -> IndexResult<Option<TransactionBatch>>;

    /// Get the highest-index transaction batch.
    fn latest_transaction_batch(&self) -> IndexResult<Option<TransactionBatch>>;

    /// Insert transaction batches. Existing indices are left untouched.
    fn put_transaction_batches(&self, batches: &[TransactionBatch]) -> IndexResult<()>;

    // --- state roots (tiered) ---

    /// Get a state root by index within a tier.
    fn state_root_by_index(&self, tier: Tier, index: u64) -> IndexResult<Option<StateRootEntry>>;

    /// Get the highest-index state root within a tier.
    fn latest_state_root(&self, tier: Tier) -> IndexResult<Option<StateRootEntry>>;

    /// Scan state roots in `[lo, hi)` within a tier, in index order.
    fn state_root_range(&self, tier: Tier, lo: u64, hi: u64)
        -> IndexResult<Vec<StateRootEntry>>;

    /// Insert state roots into a tier. Existing indices are left untouched.
    fn put_state_roots(&self, tier: Tier, roots: &[StateRootEntry]) -> IndexResult<()>;

    // --- state root batches (confirmed only) ---

    /// Get a state root batch by index.
    fn state_root_batch_by_index(&self, index: u64) -> IndexResult<Option<StateRootBatch>>;

    /// Get the highest-index state root batch.
    fn latest_state_root_batch(&self) -> IndexResult<Option<StateRootBatch>>;

    /// Insert state root batches. Existing indices are left untouched.
    fn put_state_root_batches(&self, batches: &[StateRootBatch]) -> IndexResult<()>;

    // --- sync bookkeeping ---

    /// Highest L2 block index the ingestion side has seen, if any.
    fn highest_known_index(&self) -> IndexResult<Option<u64>>;

    /// Advance the highest known index. Values below the current one are
    /// ignored; the index never moves backwards.
    fn set_highest_known_index(&self, index: u64) -> IndexResult<()>;
}
