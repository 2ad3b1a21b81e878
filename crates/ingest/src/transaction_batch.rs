//! Handler for transaction batch events.
//!
//! Fix is 1:1 with no enrichment. Parse lifts each event into a
//! [`TransactionBatch`] header; the batch's children are the sequencer's own
//! business and arrive through the unconfirmed side, so this handler stores
//! headers only. The submitting account becomes the batch submitter and the
//! emitting block supplies position and timestamp.

use ferry_index::{RecordStore, TransactionBatch};

use crate::pipeline::{
    arg_to_u64, EventArgs, EventContext, EventHandler, EventKind, FixedEvent, IngestError,
    IngestResult, ParsedRecords, RawEvent,
};

pub struct TransactionBatchHandler;

impl EventHandler for TransactionBatchHandler {
    fn kind(&self) -> EventKind {
        EventKind::TransactionBatchAppended
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
        let mut batches = Vec::with_capacity(events.len());
        for fixed in events {
            let EventArgs::TransactionBatchAppended {
                batch_index,
                batch_root,
                batch_size,
                prev_total_elements,
                extra_data,
            } = &fixed.event.args
            else {
                return Err(IngestError::MalformedEvent(format!(
                    "expected transaction batch arguments, got {:?}",
                    fixed.event.args.kind()
                )));
            };

            batches.push(TransactionBatch {
                index: arg_to_u64("batchIndex", *batch_index)?,
                block_number: fixed.event.block_number,
                timestamp: fixed.event.block_timestamp,
                submitter: fixed.event.sender,
                size: arg_to_u64("batchSize", *batch_size)?,
                prev_total_elements: arg_to_u64("prevTotalElements", *prev_total_elements)?,
                root: *batch_root,
                extra_data: extra_data.clone(),
            });
        }
        Ok(ParsedRecords::TransactionBatches(batches))
    }

    fn store(&self, records: &ParsedRecords, store: &dyn RecordStore) -> IngestResult<()> {
        let ParsedRecords::TransactionBatches(batches) = records else {
            return Err(IngestError::MalformedEvent(
                "transaction batch handler fed wrong record kind".to_string(),
            ));
        };
        store.put_transaction_batches(batches)?;
        Ok(())
    }
}
