//! Query-side resolvers over the record store.
//!
//! Three concerns live here: sync status reporting, the confirmed/unconfirmed
//! merge, and batch range reconstruction. All of them are pure read merges
//! over an append-only store; they hold no mutable state and are safe to call
//! concurrently with ingestion writes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};
use crate::store::RecordStore;
use crate::types::{
    EnqueueEntry, Indexed, IndexedTransaction, StateRootBatch, StateRootEntry, Tier,
    TransactionBatch,
};

/// How to pick a batch for reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSelector {
    /// The highest-index batch.
    Latest,
    /// A specific batch index.
    Index(u64),
}

/// Ingestion progress relative to the highest index seen on the remote chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Whether ingestion is behind the highest known index.
    pub syncing: bool,
    /// Index of the latest persisted confirmed transaction (0 when empty).
    pub current_index: u64,
    /// Highest index known to exist, when ahead of `current_index`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_known_index: Option<u64>,
}

/// Index-precedence merge of a confirmed and an unconfirmed candidate.
///
/// The unconfirmed record wins only when the confirmed one is absent or
/// strictly behind; a confirmed record at the same index supersedes. This is
/// the whole confirmation merge: a comparison, not a content merge.
pub fn merge_by_index<T: Indexed>(confirmed: Option<T>, unconfirmed: Option<T>) -> Option<T> {
    match (confirmed, unconfirmed) {
        (None, unconfirmed) => unconfirmed,
        (confirmed, None) => confirmed,
        (Some(c), Some(u)) => {
            if u.record_index() > c.record_index() {
                Some(u)
            } else {
                Some(c)
            }
        }
    }
}

/// Consistent, merged view over the record store.
///
/// `expose_unconfirmed` gates the unconfirmed tier: when disabled, every
/// query serves confirmed data unconditionally.
pub struct IndexView {
    store: Arc<dyn RecordStore>,
    expose_unconfirmed: bool,
}

impl IndexView {
    /// Create a view over a store.
    pub fn new(store: Arc<dyn RecordStore>, expose_unconfirmed: bool) -> Self {
        Self {
            store,
            expose_unconfirmed,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Whether unconfirmed records are visible through this view.
    pub fn exposes_unconfirmed(&self) -> bool {
        self.expose_unconfirmed
    }

    /// Report ingestion progress against the highest known index.
    pub fn sync_status(&self) -> IndexResult<SyncStatus> {
        let highest = self.store.highest_known_index()?;
        let latest_tx = self.store.latest_transaction(Tier::Confirmed)?;

        let status = match (latest_tx, highest) {
            (None, None) => SyncStatus {
                syncing: false,
                current_index: 0,
                highest_known_index: None,
            },
            (None, Some(h)) => SyncStatus {
                syncing: true,
                current_index: 0,
                highest_known_index: Some(h),
            },
            (Some(tx), Some(h)) if h > tx.index => SyncStatus {
                syncing: true,
                current_index: tx.index,
                highest_known_index: Some(h),
            },
            (Some(tx), _) => SyncStatus {
                syncing: false,
                current_index: tx.index,
                highest_known_index: None,
            },
        };
        Ok(status)
    }

    /// Latest transaction across tiers (merged by index precedence).
    pub fn latest_transaction(&self) -> IndexResult<Option<IndexedTransaction>> {
        let confirmed = self.store.latest_transaction(Tier::Confirmed)?;
        if !self.expose_unconfirmed {
            return Ok(confirmed);
        }
        let unconfirmed = self.store.latest_transaction(Tier::Unconfirmed)?;
        Ok(merge_by_index(confirmed, unconfirmed))
    }

    /// Transaction at `index` across tiers (merged by index precedence).
    pub fn transaction_by_index(&self, index: u64) -> IndexResult<Option<IndexedTransaction>> {
        let confirmed = self.store.transaction_by_index(Tier::Confirmed, index)?;
        if !self.expose_unconfirmed {
            return Ok(confirmed);
        }
        let unconfirmed = self.store.transaction_by_index(Tier::Unconfirmed, index)?;
        Ok(merge_by_index(confirmed, unconfirmed))
    }

    /// Latest state root across tiers (merged by index precedence).
    pub fn latest_state_root(&self) -> IndexResult<Option<StateRootEntry>> {
        let confirmed = self.store.latest_state_root(Tier::Confirmed)?;
        if !self.expose_unconfirmed {
            return Ok(confirmed);
        }
        let unconfirmed = self.store.latest_state_root(Tier::Unconfirmed)?;
        Ok(merge_by_index(confirmed, unconfirmed))
    }

    /// State root at `index` across tiers (merged by index precedence).
    pub fn state_root_by_index(&self, index: u64) -> IndexResult<Option<StateRootEntry>> {
        let confirmed = self.store.state_root_by_index(Tier::Confirmed, index)?;
        if !self.expose_unconfirmed {
            return Ok(confirmed);
        }
        let unconfirmed = self.store.state_root_by_index(Tier::Unconfirmed, index)?;
        Ok(merge_by_index(confirmed, unconfirmed))
    }

    /// The confirmed batch containing a merged transaction, if any.
    ///
    /// Unconfirmed records carry no batch index, so the batch half of the
    /// response is null exactly when the record raced ahead of confirmation.
    pub fn batch_for_transaction(
        &self,
        tx: &IndexedTransaction,
    ) -> IndexResult<Option<TransactionBatch>> {
        match tx.batch_index {
            Some(batch_index) => self.store.transaction_batch_by_index(batch_index),
            None => Ok(None),
        }
    }

    /// The confirmed batch containing a merged state root, if any.
    pub fn batch_for_state_root(
        &self,
        root: &StateRootEntry,
    ) -> IndexResult<Option<StateRootBatch>> {
        match root.batch_index {
            Some(batch_index) => self.store.state_root_batch_by_index(batch_index),
            None => Ok(None),
        }
    }

    /// An enqueue entry with its `ctc_index` filled from the queue mapping.
    pub fn enqueue_by_index(&self, index: u64) -> IndexResult<Option<EnqueueEntry>> {
        let entry = self.store.enqueue_by_index(index)?;
        self.fill_ctc_index(entry)
    }

    /// The latest enqueue entry with its `ctc_index` filled.
    pub fn latest_enqueue(&self) -> IndexResult<Option<EnqueueEntry>> {
        let entry = self.store.latest_enqueue()?;
        self.fill_ctc_index(entry)
    }

    fn fill_ctc_index(&self, entry: Option<EnqueueEntry>) -> IndexResult<Option<EnqueueEntry>> {
        let Some(mut entry) = entry else {
            return Ok(None);
        };
        entry.ctc_index = self.store.transaction_index_by_queue_index(entry.index)?;
        Ok(Some(entry))
    }

    /// A transaction batch and its contiguous children, in index order.
    ///
    /// An absent batch yields `(None, [])`, never an error. A child range
    /// shorter than the batch's declared size means the store invariant does
    /// not hold and is surfaced as [`IndexError::IncompleteBatch`].
    pub fn transaction_batch_with_children(
        &self,
        selector: BatchSelector,
    ) -> IndexResult<(Option<TransactionBatch>, Vec<IndexedTransaction>)> {
        let batch = match selector {
            BatchSelector::Latest => self.store.latest_transaction_batch()?,
            BatchSelector::Index(i) => self.store.transaction_batch_by_index(i)?,
        };
        let Some(batch) = batch else {
            return Ok((None, Vec::new()));
        };

        let lo = batch.prev_total_elements;
        let hi = lo
            .checked_add(batch.size)
            .ok_or(IndexError::BatchRangeOverflow(batch.index))?;
        let children = self.store.transaction_range(Tier::Confirmed, lo, hi)?;
        if (children.len() as u64) != batch.size {
            return Err(IndexError::IncompleteBatch {
                batch_index: batch.index,
                expected: batch.size,
                actual: children.len() as u64,
            });
        }
        Ok((Some(batch), children))
    }

    /// A state root batch and its contiguous children, in index order.
    pub fn state_root_batch_with_children(
        &self,
        selector: BatchSelector,
    ) -> IndexResult<(Option<StateRootBatch>, Vec<StateRootEntry>)> {
        let batch = match selector {
            BatchSelector::Latest => self.store.latest_state_root_batch()?,
            BatchSelector::Index(i) => self.store.state_root_batch_by_index(i)?,
        };
        let Some(batch) = batch else {
            return Ok((None, Vec::new()));
        };

        let lo = batch.prev_total_elements;
        let hi = lo
            .checked_add(batch.size)
            .ok_or(IndexError::BatchRangeOverflow(batch.index))?;
        let children = self.store.state_root_range(Tier::Confirmed, lo, hi)?;
        if (children.len() as u64) != batch.size {
            return Err(IndexError::IncompleteBatch {
                batch_index: batch.index,
                expected: batch.size,
                actual: children.len() as u64,
            });
        }
        Ok((Some(batch), children))
    }
}
