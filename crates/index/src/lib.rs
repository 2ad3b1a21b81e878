//! Indexed chain records and the merged read view over them.
//!
//! This crate owns the read side of the transport node: the record types,
//! the storage contract and its SQLite implementation, the resolvers that
//! merge confirmed and unconfirmed tiers, and the remote chain client used
//! to anchor confirmation depth.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    HTTP API                          │
//! │                  (ferry_api)                         │
//! └───────────────────────┬─────────────────────────────┘
//!                         │
//!           ┌─────────────▼─────────────┐
//!           │        IndexView          │
//!           │  (merge + reconstruction) │
//!           └──────┬─────────────┬──────┘
//!                  │             │
//!                  ▼             ▼
//!      ┌───────────────────┐ ┌──────────────────┐
//!      │    RecordStore    │ │ RemoteChainClient│
//!      │ (SQLite, tiered)  │ │  (tip + blocks)  │
//!      └───────────────────┘ └──────────────────┘
//! ```
//!
//! Writes come in from `ferry_ingest` through the same [`RecordStore`]
//! contract; reads never block on ingestion.

pub mod error;
pub mod l1;
pub mod sqlite;
pub mod store;
pub mod types;
pub mod view;

pub use error::{IndexError, IndexResult};
pub use l1::{HttpChainClient, RemoteChainClient};
pub use sqlite::PersistentRecordStore;
pub use store::RecordStore;
pub use types::*;
pub use view::{merge_by_index, BatchSelector, IndexView, SyncStatus};
