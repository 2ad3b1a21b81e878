//! Event ingestion for the transport index.
//!
//! Raw chain events enter here and come out as canonical records in the
//! record store. Every event kind runs the same three stages (fix, parse,
//! store) behind the [`EventHandler`] trait; [`ingest`] dispatches a mixed
//! batch to the right handlers.

pub mod enqueue;
pub mod pipeline;
pub mod state_batch;
pub mod transaction_batch;

pub use enqueue::EnqueueHandler;
pub use pipeline::{
    handler_for, ingest, EventArgs, EventContext, EventHandler, EventKind, FixedEvent,
    IngestError, IngestResult, ParsedRecords, RawEvent,
};
pub use state_batch::StateBatchHandler;
pub use transaction_batch::TransactionBatchHandler;
