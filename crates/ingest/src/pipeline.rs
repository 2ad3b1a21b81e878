//! The three-stage ingestion contract.
//!
//! Every event kind is ingested through the same shape: `fix` normalizes and
//! enriches raw chain events with auxiliary context, `parse` turns fixed
//! events into canonical records, `store` persists them. Fix and parse are
//! pure with respect to the record store; only the store stage writes. A
//! failure in any stage is fatal to that batch of events, nothing is
//! partially stored and ingestion does not advance past the gap.

use alloy_primitives::{Address, Bytes, B256, U256};
use ferry_index::{
    EnqueueEntry, IndexError, RecordStore, StateRootBatch, StateRootEntry, TransactionBatch,
};
use thiserror::Error;

/// Errors raised while ingesting a batch of events.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An event's arguments do not fit the canonical record shape. Fatal to
    /// the batch; silently skipping would break index contiguity.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// An auxiliary context lookup failed during the fix stage.
    #[error("context lookup failed: {0}")]
    Context(String),

    /// The store stage failed to persist the parsed records.
    #[error(transparent)]
    Store(#[from] IndexError),
}

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// The closed set of event kinds the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A message was enqueued for inclusion in the canonical chain.
    TransactionEnqueued,
    /// A transaction batch was appended to the canonical chain.
    TransactionBatchAppended,
    /// A state root batch was appended.
    StateBatchAppended,
}

/// Decoded arguments of a chain event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventArgs {
    /// `TransactionEnqueued(l1TxOrigin, target, gasLimit, data, queueIndex, timestamp)`
    TransactionEnqueued {
        l1_tx_origin: Address,
        target: Address,
        gas_limit: U256,
        data: Bytes,
        queue_index: U256,
        timestamp: U256,
    },
    /// `TransactionBatchAppended(batchIndex, batchRoot, batchSize, prevTotalElements, extraData)`
    TransactionBatchAppended {
        batch_index: U256,
        batch_root: B256,
        batch_size: U256,
        prev_total_elements: U256,
        extra_data: Bytes,
    },
    /// `StateBatchAppended(batchIndex, batchRoot, batchSize, prevTotalElements, extraData)`
    StateBatchAppended {
        batch_index: U256,
        batch_root: B256,
        batch_size: U256,
        prev_total_elements: U256,
        extra_data: Bytes,
    },
}

impl EventArgs {
    /// The kind this argument set belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            EventArgs::TransactionEnqueued { .. } => EventKind::TransactionEnqueued,
            EventArgs::TransactionBatchAppended { .. } => EventKind::TransactionBatchAppended,
            EventArgs::StateBatchAppended { .. } => EventKind::StateBatchAppended,
        }
    }
}

/// A decoded chain log with its position metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Timestamp of that block.
    pub block_timestamp: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// Account that sent the emitting transaction.
    pub sender: Address,
    /// Decoded event arguments.
    pub args: EventArgs,
}

/// A raw event paired with whatever auxiliary data the fix stage attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedEvent {
    /// The event as received.
    pub event: RawEvent,
    /// Handler-specific enrichment, `None` for 1:1 handlers.
    pub extra_data: Option<Bytes>,
}

/// Auxiliary chain context the fix stage may consult.
///
/// Lookups are served from data fetched alongside the logs, so the trait is
/// synchronous like the record store.
pub trait EventContext {
    /// Calldata of the transaction with the given hash, if known.
    fn transaction_input(&self, transaction_hash: B256) -> IngestResult<Option<Bytes>>;
}

/// Records produced by a handler's parse stage, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecords {
    /// Enqueue entries, one per event.
    Enqueue(Vec<EnqueueEntry>),
    /// Transaction batch headers, one per event.
    TransactionBatches(Vec<TransactionBatch>),
    /// State root batches with their child roots, one pair per event.
    StateRootBatches(Vec<(StateRootBatch, Vec<StateRootEntry>)>),
}

/// One event kind's ingestion logic.
///
/// Implementations keep the stages segregated: `fix` and `parse` never touch
/// the store, `store` never inspects event arguments.
pub trait EventHandler: Send + Sync {
    /// The event kind this handler ingests.
    fn kind(&self) -> EventKind;

    /// Normalize and enrich raw events. Preserves input order; 1:1 unless
    /// the handler documents otherwise.
    fn fix(&self, events: Vec<RawEvent>, ctx: &dyn EventContext)
        -> IngestResult<Vec<FixedEvent>>;

    /// Extract canonical records from fixed events. Pure; any malformed
    /// argument fails the whole batch.
    fn parse(&self, events: &[FixedEvent]) -> IngestResult<ParsedRecords>;

    /// Persist parsed records through the kind's batched-insert operation.
    fn store(&self, records: &ParsedRecords, store: &dyn RecordStore) -> IngestResult<()>;
}

/// Downcast a `U256` event argument to `u64`, failing the batch on overflow.
pub(crate) fn arg_to_u64(name: &str, value: U256) -> IngestResult<u64> {
    value
        .try_into()
        .map_err(|_| IngestError::MalformedEvent(format!("argument {name} exceeds u64: {value}")))
}

/// The handler for an event kind.
pub fn handler_for(kind: EventKind) -> Box<dyn EventHandler> {
    match kind {
        EventKind::TransactionEnqueued => Box::new(crate::enqueue::EnqueueHandler),
        EventKind::TransactionBatchAppended => {
            Box::new(crate::transaction_batch::TransactionBatchHandler)
        }
        EventKind::StateBatchAppended => Box::new(crate::state_batch::StateBatchHandler),
    }
}

/// Run the full pipeline over a batch of events.
///
/// Events are grouped by kind in first-seen order and each group runs its
/// three stages sequentially. The store stage for a kind is a critical
/// section; callers serialize concurrent `ingest` calls per kind to keep the
/// no-gap invariant. A failed group stops ingestion for that kind with
/// nothing stored.
pub fn ingest(
    events: Vec<RawEvent>,
    ctx: &dyn EventContext,
    store: &dyn RecordStore,
) -> IngestResult<()> {
    let mut groups: Vec<(EventKind, Vec<RawEvent>)> = Vec::new();
    for event in events {
        let kind = event.args.kind();
        match groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, group)) => group.push(event),
            None => groups.push((kind, vec![event])),
        }
    }

    for (kind, group) in groups {
        let count = group.len();
        let handler = handler_for(kind);
        let fixed = handler.fix(group, ctx)?;
        let records = handler.parse(&fixed)?;
        handler.store(&records, store)?;
        tracing::debug!(?kind, count, "ingested event batch");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// Context backed by a hash map of transaction calldata.
    pub struct StaticContext {
        inputs: HashMap<B256, Bytes>,
    }

    impl StaticContext {
        pub fn empty() -> Self {
            Self {
                inputs: HashMap::new(),
            }
        }

        pub fn with_input(mut self, hash: B256, input: Bytes) -> Self {
            self.inputs.insert(hash, input);
            self
        }
    }

    impl EventContext for StaticContext {
        fn transaction_input(&self, transaction_hash: B256) -> IngestResult<Option<Bytes>> {
            Ok(self.inputs.get(&transaction_hash).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StaticContext;
    use super::*;
    use ferry_index::{PersistentRecordStore, Tier};

    fn enqueue_event(queue_index: u64, block_number: u64) -> RawEvent {
        RawEvent {
            block_number,
            block_timestamp: 1_000,
            transaction_hash: B256::repeat_byte(0x11),
            sender: Address::repeat_byte(0x22),
            args: EventArgs::TransactionEnqueued {
                l1_tx_origin: Address::repeat_byte(0x33),
                target: Address::repeat_byte(0x44),
                gas_limit: U256::from(21_000u64),
                data: Bytes::new(),
                queue_index: U256::from(queue_index),
                timestamp: U256::from(1_000u64),
            },
        }
    }

    fn tx_batch_event(batch_index: u64) -> RawEvent {
        RawEvent {
            block_number: 60,
            block_timestamp: 1_200,
            transaction_hash: B256::repeat_byte(0x55),
            sender: Address::repeat_byte(0x66),
            args: EventArgs::TransactionBatchAppended {
                batch_index: U256::from(batch_index),
                batch_root: B256::repeat_byte(0x77),
                batch_size: U256::from(2u64),
                prev_total_elements: U256::ZERO,
                extra_data: Bytes::new(),
            },
        }
    }

    #[test]
    fn mixed_kinds_are_grouped_and_stored() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let events = vec![
            enqueue_event(0, 50),
            tx_batch_event(0),
            enqueue_event(1, 51),
        ];

        ingest(events, &StaticContext::empty(), &store).expect("ingest");

        assert_eq!(
            store.latest_enqueue().expect("read").expect("entry").index,
            1
        );
        assert_eq!(
            store
                .latest_transaction_batch()
                .expect("read")
                .expect("batch")
                .index,
            0
        );
    }

    #[test]
    fn oversized_argument_fails_the_batch_without_storing() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let mut bad = enqueue_event(0, 50);
        if let EventArgs::TransactionEnqueued { gas_limit, .. } = &mut bad.args {
            *gas_limit = U256::MAX;
        }
        let events = vec![enqueue_event(1, 50), bad];

        let err = ingest(events, &StaticContext::empty(), &store)
            .expect_err("overflow must be fatal");
        assert!(matches!(err, IngestError::MalformedEvent(_)));
        assert!(store.latest_enqueue().expect("read").is_none());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let store = PersistentRecordStore::in_memory().expect("store");
        ingest(Vec::new(), &StaticContext::empty(), &store).expect("ingest");
        assert!(store
            .latest_transaction(Tier::Confirmed)
            .expect("read")
            .is_none());
    }
}
