//! Record types for the transport index.
//!
//! Every record is identified by a monotonic non-negative `index`, unique
//! within its kind and tier. Records are immutable once stored; the only
//! permitted enrichment is the write-once `ctc_index` on enqueue entries.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Storage tier for record kinds that exist in two variants.
///
/// A confirmed record at index `i` permanently supersedes any unconfirmed
/// record at `i`; the reverse never happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Records derived from settled chain data.
    Confirmed,
    /// Records derived from not-yet-settled data; indices may race ahead
    /// of the confirmed frontier.
    Unconfirmed,
}

/// Where a transaction originally entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOrigin {
    /// Submitted directly to the sequencer.
    Sequencer,
    /// Enqueued on the remote chain and pulled into the canonical chain.
    L1,
}

/// A message enqueued on the remote chain, waiting for (or already given)
/// a position in the canonical transaction chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueEntry {
    /// Queue index, contiguous from 0.
    pub index: u64,
    /// Call target on the destination chain.
    pub target: Address,
    /// Call payload.
    pub data: Bytes,
    /// Gas limit reserved for the call.
    pub gas_limit: u64,
    /// Account that enqueued the message.
    pub origin: Address,
    /// Remote chain block the enqueue event was emitted in.
    pub block_number: u64,
    /// Remote chain timestamp of the enqueue event.
    pub timestamp: u64,
    /// Position in the canonical transaction chain, filled in once known.
    /// Write-once: never reset after assignment.
    pub ctc_index: Option<u64>,
}

/// An indexed transaction, confirmed or unconfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTransaction {
    /// Transaction index, contiguous from 0 within its tier.
    pub index: u64,
    /// Index of the batch containing this transaction.
    /// `None` for unconfirmed entries, which have no confirmed batch yet.
    pub batch_index: Option<u64>,
    /// Remote chain block the transaction was derived from.
    pub block_number: u64,
    /// Timestamp assigned to the transaction.
    pub timestamp: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Call target.
    pub target: Address,
    /// Originating account, when the transaction came through the queue.
    pub origin: Option<Address>,
    /// Call payload.
    pub data: Bytes,
    /// How the transaction entered the system.
    pub queue_origin: QueueOrigin,
    /// Queue index for `QueueOrigin::L1` transactions.
    pub queue_index: Option<u64>,
    /// Value transferred.
    pub value: U256,
}

/// A contiguous group of transactions described by an offset and a size.
///
/// Defines the half-open child range
/// `[prev_total_elements, prev_total_elements + size)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBatch {
    /// Batch index, contiguous from 0.
    pub index: u64,
    /// Remote chain block the batch was submitted in.
    pub block_number: u64,
    /// Submission timestamp.
    pub timestamp: u64,
    /// Account that submitted the batch.
    pub submitter: Address,
    /// Number of child transactions.
    pub size: u64,
    /// Index of the first child transaction.
    pub prev_total_elements: u64,
    /// Merkle root over the batch contents.
    pub root: B256,
    /// Chain-specific extra data.
    pub extra_data: Bytes,
}

/// A state root, confirmed or unconfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRootEntry {
    /// State root index, contiguous from 0 within its tier.
    pub index: u64,
    /// Index of the batch containing this root; `None` for unconfirmed entries.
    pub batch_index: Option<u64>,
    /// The root itself.
    pub value: B256,
}

/// A contiguous group of state roots, same shape as [`TransactionBatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRootBatch {
    /// Batch index, contiguous from 0.
    pub index: u64,
    /// Remote chain block the batch was submitted in.
    pub block_number: u64,
    /// Submission timestamp.
    pub timestamp: u64,
    /// Account that submitted the batch.
    pub submitter: Address,
    /// Number of child state roots.
    pub size: u64,
    /// Index of the first child state root.
    pub prev_total_elements: u64,
    /// Merkle root over the batch contents.
    pub root: B256,
    /// Chain-specific extra data.
    pub extra_data: Bytes,
}

/// Block metadata from the remote chain that anchors confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContext {
    /// Block height.
    pub number: u64,
    /// Block timestamp (Unix seconds).
    pub timestamp: u64,
    /// Block hash.
    pub hash: B256,
}

/// Records addressable by a monotonic index.
///
/// The confirmation merge (one index-precedence comparison, not a content
/// merge) is generic over this trait.
pub trait Indexed {
    /// The record's index within its kind and tier.
    fn record_index(&self) -> u64;
}

impl Indexed for IndexedTransaction {
    fn record_index(&self) -> u64 {
        self.index
    }
}

impl Indexed for StateRootEntry {
    fn record_index(&self) -> u64 {
        self.index
    }
}

impl Indexed for EnqueueEntry {
    fn record_index(&self) -> u64 {
        self.index
    }
}
