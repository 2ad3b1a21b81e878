//! Handler for state root batch events.
//!
//! The event itself only carries the batch header; the roots travel in the
//! calldata of the submitting transaction. The fix stage cross-references
//! that calldata through the [`EventContext`] and attaches it as extra data,
//! so parse stays pure: it decodes the `appendStateBatch(bytes32[],uint256)`
//! argument block and emits the header together with its child roots.

use alloy_primitives::{Bytes, B256};
use ferry_index::{RecordStore, StateRootBatch, StateRootEntry};

use crate::pipeline::{
    arg_to_u64, EventArgs, EventContext, EventHandler, EventKind, FixedEvent, IngestError,
    IngestResult, ParsedRecords, RawEvent,
};

pub struct StateBatchHandler;

const WORD: usize = 32;

fn word_at(data: &[u8], offset: usize) -> IngestResult<&[u8]> {
    data.get(offset..offset + WORD).ok_or_else(|| {
        IngestError::MalformedEvent(format!(
            "calldata truncated: need word at offset {offset}, have {} bytes",
            data.len()
        ))
    })
}

fn usize_word(data: &[u8], offset: usize, name: &str) -> IngestResult<usize> {
    let word = word_at(data, offset)?;
    // Offsets and lengths fit comfortably in u64 for any real calldata.
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(IngestError::MalformedEvent(format!(
            "calldata word {name} exceeds u64"
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(buf) as usize)
}

/// Decode the `bytes32[]` argument out of `appendStateBatch` calldata.
///
/// Layout after the 4-byte selector: offset word for the array, the
/// `_shouldStartAtElement` word, then the array length and its elements.
fn decode_append_state_batch(calldata: &[u8]) -> IngestResult<Vec<B256>> {
    let args = calldata.get(4..).ok_or_else(|| {
        IngestError::MalformedEvent("calldata shorter than a selector".to_string())
    })?;

    let array_offset = usize_word(args, 0, "array offset")?;
    let length = usize_word(args, array_offset, "array length")?;

    let mut roots = Vec::with_capacity(length);
    for i in 0..length {
        let word = word_at(args, array_offset + WORD + i * WORD)?;
        roots.push(B256::from_slice(word));
    }
    Ok(roots)
}

impl EventHandler for StateBatchHandler {
    fn kind(&self) -> EventKind {
        EventKind::StateBatchAppended
    }

    /// 1:1, enriched with the submission transaction's calldata. A missing
    /// transaction is a context failure: the roots are unrecoverable without
    /// it and skipping would leave a gap.
    fn fix(&self, events: Vec<RawEvent>, ctx: &dyn EventContext)
        -> IngestResult<Vec<FixedEvent>> {
        events
            .into_iter()
            .map(|event| {
                let input = ctx.transaction_input(event.transaction_hash)?.ok_or_else(|| {
                    IngestError::Context(format!(
                        "no calldata for submission transaction {}",
                        event.transaction_hash
                    ))
                })?;
                Ok(FixedEvent {
                    event,
                    extra_data: Some(input),
                })
            })
            .collect()
    }

    fn parse(&self, events: &[FixedEvent]) -> IngestResult<ParsedRecords> {
        let mut parsed = Vec::with_capacity(events.len());
        for fixed in events {
            let EventArgs::StateBatchAppended {
                batch_index,
                batch_root,
                batch_size,
                prev_total_elements,
                extra_data,
            } = &fixed.event.args
            else {
                return Err(IngestError::MalformedEvent(format!(
                    "expected state batch arguments, got {:?}",
                    fixed.event.args.kind()
                )));
            };
            let calldata = fixed.extra_data.as_ref().ok_or_else(|| {
                IngestError::MalformedEvent(
                    "state batch event missing submission calldata".to_string(),
                )
            })?;

            let batch = StateRootBatch {
                index: arg_to_u64("batchIndex", *batch_index)?,
                block_number: fixed.event.block_number,
                timestamp: fixed.event.block_timestamp,
                submitter: fixed.event.sender,
                size: arg_to_u64("batchSize", *batch_size)?,
                prev_total_elements: arg_to_u64("prevTotalElements", *prev_total_elements)?,
                root: *batch_root,
                extra_data: extra_data.clone(),
            };

            let values = decode_append_state_batch(calldata)?;
            if values.len() as u64 != batch.size {
                return Err(IngestError::MalformedEvent(format!(
                    "batch {} declares {} roots, calldata carries {}",
                    batch.index,
                    batch.size,
                    values.len()
                )));
            }

            let roots = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| StateRootEntry {
                    index: batch.prev_total_elements + i as u64,
                    batch_index: Some(batch.index),
                    value,
                })
                .collect();
            parsed.push((batch, roots));
        }
        Ok(ParsedRecords::StateRootBatches(parsed))
    }

    fn store(&self, records: &ParsedRecords, store: &dyn RecordStore) -> IngestResult<()> {
        let ParsedRecords::StateRootBatches(parsed) = records else {
            return Err(IngestError::MalformedEvent(
                "state batch handler fed wrong record kind".to_string(),
            ));
        };
        for (batch, roots) in parsed {
            store.put_state_roots(ferry_index::Tier::Confirmed, roots)?;
            store.put_state_root_batches(std::slice::from_ref(batch))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::StaticContext;
    use alloy_primitives::{Address, U256};
    use ferry_index::{PersistentRecordStore, Tier};

    fn u64_word(v: u64) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&v.to_be_bytes());
        w
    }

    fn append_calldata(roots: &[B256], start: u64) -> Bytes {
        let mut data = vec![0xaa, 0xbb, 0xcc, 0xdd];
        data.extend_from_slice(&u64_word(64)); // offset to the array
        data.extend_from_slice(&u64_word(start));
        data.extend_from_slice(&u64_word(roots.len() as u64));
        for root in roots {
            data.extend_from_slice(root.as_slice());
        }
        Bytes::from(data)
    }

    fn event(batch_index: u64, prev_total_elements: u64, size: u64) -> RawEvent {
        RawEvent {
            block_number: 90,
            block_timestamp: 3_000,
            transaction_hash: B256::repeat_byte(0xee),
            sender: Address::repeat_byte(0xef),
            args: EventArgs::StateBatchAppended {
                batch_index: U256::from(batch_index),
                batch_root: B256::repeat_byte(0xf0),
                batch_size: U256::from(size),
                prev_total_elements: U256::from(prev_total_elements),
                extra_data: Bytes::new(),
            },
        }
    }

    #[test]
    fn decode_extracts_roots_from_calldata() {
        let roots = vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)];
        let calldata = append_calldata(&roots, 10);
        assert_eq!(
            decode_append_state_batch(&calldata).expect("decode"),
            roots
        );
    }

    #[test]
    fn truncated_calldata_is_malformed() {
        let calldata = append_calldata(&[B256::repeat_byte(0x01)], 0);
        let cut = &calldata[..calldata.len() - 1];
        let err = decode_append_state_batch(cut).expect_err("must fail");
        assert!(matches!(err, IngestError::MalformedEvent(_)));
    }

    #[test]
    fn full_pipeline_stores_header_and_children() {
        let handler = StateBatchHandler;
        let store = PersistentRecordStore::in_memory().expect("store");
        let roots = vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)];
        let ctx = StaticContext::empty()
            .with_input(B256::repeat_byte(0xee), append_calldata(&roots, 10));

        let fixed = handler.fix(vec![event(2, 10, 2)], &ctx).expect("fix");
        let records = handler.parse(&fixed).expect("parse");
        handler.store(&records, &store).expect("store");

        let batch = store
            .state_root_batch_by_index(2)
            .expect("read")
            .expect("batch should exist");
        assert_eq!(batch.size, 2);

        let children = store
            .state_root_range(Tier::Confirmed, 10, 12)
            .expect("range");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].index, 10);
        assert_eq!(children[0].batch_index, Some(2));
        assert_eq!(children[1].value, B256::repeat_byte(0x02));
    }

    #[test]
    fn missing_submission_calldata_fails_fix() {
        let handler = StateBatchHandler;
        let err = handler
            .fix(vec![event(0, 0, 1)], &StaticContext::empty())
            .expect_err("missing calldata must fail");
        assert!(matches!(err, IngestError::Context(_)));
    }

    #[test]
    fn root_count_mismatch_is_malformed() {
        let handler = StateBatchHandler;
        let ctx = StaticContext::empty().with_input(
            B256::repeat_byte(0xee),
            append_calldata(&[B256::repeat_byte(0x01)], 0),
        );

        // Event declares two roots, calldata carries one.
        let fixed = handler.fix(vec![event(0, 0, 2)], &ctx).expect("fix");
        let err = handler.parse(&fixed).expect_err("must fail");
        assert!(matches!(err, IngestError::MalformedEvent(_)));
    }
}
