//! Handler for enqueue events.
//!
//! The simplest handler: fix is 1:1 with no enrichment, parse lifts the
//! event arguments straight into an [`EnqueueEntry`], store appends through
//! the idempotent batched insert. `ctc_index` starts null and is filled in
//! later by the transaction batch side.

use ferry_index::{EnqueueEntry, RecordStore};

use crate::pipeline::{
    arg_to_u64, EventArgs, EventContext, EventHandler, EventKind, FixedEvent, IngestError,
    IngestResult, ParsedRecords, RawEvent,
};

pub struct EnqueueHandler;

impl EventHandler for EnqueueHandler {
    fn kind(&self) -> EventKind {
        EventKind::TransactionEnqueued
    }

    fn fix(
        &self,
        events: Vec<RawEvent>,
        _ctx: &dyn EventContext,
    ) -> IngestResult<Vec<FixedEvent>> {
        Ok(events
            .into_iter()
            .map(|event| FixedEvent {
                event,
                extra_data: None,
            })
            .collect())
    }

    fn parse(&self, events: &[FixedEvent]) -> IngestResult<ParsedRecords> {
        let mut entries = Vec::with_capacity(events.len());
        for fixed in events {
            let EventArgs::TransactionEnqueued {
                l1_tx_origin,
                target,
                gas_limit,
                data,
                queue_index,
                timestamp,
            } = &fixed.event.args
            else {
                return Err(IngestError::MalformedEvent(format!(
                    "expected enqueue arguments, got {:?}",
                    fixed.event.args.kind()
                )));
            };

            entries.push(EnqueueEntry {
                index: arg_to_u64("queueIndex", *queue_index)?,
                target: *target,
                data: data.clone(),
                gas_limit: arg_to_u64("gasLimit", *gas_limit)?,
                origin: *l1_tx_origin,
                block_number: fixed.event.block_number,
                timestamp: arg_to_u64("timestamp", *timestamp)?,
                ctc_index: None,
            });
        }
        Ok(ParsedRecords::Enqueue(entries))
    }

    fn store(&self, records: &ParsedRecords, store: &dyn RecordStore) -> IngestResult<()> {
        let ParsedRecords::Enqueue(entries) = records else {
            return Err(IngestError::MalformedEvent(
                "enqueue handler fed non-enqueue records".to_string(),
            ));
        };
        store.put_enqueue_entries(entries)?;
        Ok(())
    }
}
