//! Route handlers and the router.
//!
//! Every route is GET, returns HTTP 200 with a JSON body on success, and
//! represents "not found" as null fields rather than a 404. Handlers share
//! no mutable state; a failing handler yields a 400 for that request only.

use std::sync::Arc;

use alloy_primitives::B256;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use ferry_index::{
    BatchSelector, BlockContext, EnqueueEntry, IndexView, IndexedTransaction, RemoteChainClient,
    StateRootBatch, StateRootEntry, TransactionBatch,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{parse_index, ApiError};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    /// Merged read view over the record store.
    pub view: Arc<IndexView>,
    /// Settlement chain client for context routes.
    pub chain: Arc<dyn RemoteChainClient>,
    /// Blocks behind the tip considered settled.
    pub confirmations: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncingResponse {
    pub syncing: bool,
    pub current_transaction_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_known_transaction_index: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub block_number: Option<u64>,
    pub timestamp: Option<u64>,
    pub block_hash: Option<B256>,
}

impl ContextResponse {
    fn absent() -> Self {
        Self {
            block_number: None,
            timestamp: None,
            block_hash: None,
        }
    }
}

impl From<Option<BlockContext>> for ContextResponse {
    fn from(block: Option<BlockContext>) -> Self {
        match block {
            Some(block) => Self {
                block_number: Some(block.number),
                timestamp: Some(block.timestamp),
                block_hash: Some(block.hash),
            },
            None => Self::absent(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub transaction: Option<IndexedTransaction>,
    pub batch: Option<TransactionBatch>,
}

#[derive(Debug, Serialize)]
pub struct TransactionBatchResponse {
    pub batch: Option<TransactionBatch>,
    pub transactions: Vec<IndexedTransaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRootResponse {
    pub state_root: Option<StateRootEntry>,
    pub batch: Option<StateRootBatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRootBatchResponse {
    pub batch: Option<StateRootBatch>,
    pub state_roots: Vec<StateRootEntry>,
}

/// Build the full GET-only router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/eth/syncing", get(syncing))
        .route("/eth/context/latest", get(context_latest))
        .route("/eth/context/blocknumber/:number", get(context_by_number))
        .route("/enqueue/latest", get(enqueue_latest))
        .route("/enqueue/index/:index", get(enqueue_by_index))
        .route("/transaction/latest", get(transaction_latest))
        .route("/transaction/index/:index", get(transaction_by_index))
        .route("/batch/transaction/latest", get(transaction_batch_latest))
        .route(
            "/batch/transaction/index/:index",
            get(transaction_batch_by_index),
        )
        .route("/stateroot/latest", get(state_root_latest))
        .route("/stateroot/index/:index", get(state_root_by_index))
        .route("/batch/stateroot/latest", get(state_root_batch_latest))
        .route(
            "/batch/stateroot/index/:index",
            get(state_root_batch_by_index),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn syncing(State(state): State<ApiState>) -> Result<Json<SyncingResponse>, ApiError> {
    let status = state.view.sync_status()?;
    Ok(Json(SyncingResponse {
        syncing: status.syncing,
        current_transaction_index: status.current_index,
        highest_known_transaction_index: status.highest_known_index,
    }))
}

async fn context_latest(
    State(state): State<ApiState>,
) -> Result<Json<ContextResponse>, ApiError> {
    let tip = state.chain.tip_height().await?;
    let settled = tip.saturating_sub(state.confirmations);
    let block = state.chain.block_by_number(settled).await?;
    Ok(Json(block.into()))
}

async fn context_by_number(
    State(state): State<ApiState>,
    Path(number): Path<String>,
) -> Result<Json<ContextResponse>, ApiError> {
    let number = parse_index(&number)?;
    let tip = state.chain.tip_height().await?;
    let settled = tip.saturating_sub(state.confirmations);
    if number > settled {
        return Ok(Json(ContextResponse::absent()));
    }
    let block = state.chain.block_by_number(number).await?;
    Ok(Json(block.into()))
}

async fn enqueue_latest(
    State(state): State<ApiState>,
) -> Result<Json<Option<EnqueueEntry>>, ApiError> {
    Ok(Json(state.view.latest_enqueue()?))
}

async fn enqueue_by_index(
    State(state): State<ApiState>,
    Path(index): Path<String>,
) -> Result<Json<Option<EnqueueEntry>>, ApiError> {
    let index = parse_index(&index)?;
    Ok(Json(state.view.enqueue_by_index(index)?))
}

fn transaction_response(
    state: &ApiState,
    tx: Option<IndexedTransaction>,
) -> Result<TransactionResponse, ApiError> {
    let batch = match &tx {
        Some(tx) => state.view.batch_for_transaction(tx)?,
        None => None,
    };
    Ok(TransactionResponse {
        transaction: tx,
        batch,
    })
}

async fn transaction_latest(
    State(state): State<ApiState>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state.view.latest_transaction()?;
    Ok(Json(transaction_response(&state, tx)?))
}

async fn transaction_by_index(
    State(state): State<ApiState>,
    Path(index): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let index = parse_index(&index)?;
    let tx = state.view.transaction_by_index(index)?;
    Ok(Json(transaction_response(&state, tx)?))
}

async fn transaction_batch_latest(
    State(state): State<ApiState>,
) -> Result<Json<TransactionBatchResponse>, ApiError> {
    let (batch, transactions) = state
        .view
        .transaction_batch_with_children(BatchSelector::Latest)?;
    Ok(Json(TransactionBatchResponse {
        batch,
        transactions,
    }))
}

async fn transaction_batch_by_index(
    State(state): State<ApiState>,
    Path(index): Path<String>,
) -> Result<Json<TransactionBatchResponse>, ApiError> {
    let index = parse_index(&index)?;
    let (batch, transactions) = state
        .view
        .transaction_batch_with_children(BatchSelector::Index(index))?;
    Ok(Json(TransactionBatchResponse {
        batch,
        transactions,
    }))
}

fn state_root_response(
    state: &ApiState,
    root: Option<StateRootEntry>,
) -> Result<StateRootResponse, ApiError> {
    let batch = match &root {
        Some(root) => state.view.batch_for_state_root(root)?,
        None => None,
    };
    Ok(StateRootResponse {
        state_root: root,
        batch,
    })
}

async fn state_root_latest(
    State(state): State<ApiState>,
) -> Result<Json<StateRootResponse>, ApiError> {
    let root = state.view.latest_state_root()?;
    Ok(Json(state_root_response(&state, root)?))
}

async fn state_root_by_index(
    State(state): State<ApiState>,
    Path(index): Path<String>,
) -> Result<Json<StateRootResponse>, ApiError> {
    let index = parse_index(&index)?;
    let root = state.view.state_root_by_index(index)?;
    Ok(Json(state_root_response(&state, root)?))
}

async fn state_root_batch_latest(
    State(state): State<ApiState>,
) -> Result<Json<StateRootBatchResponse>, ApiError> {
    let (batch, state_roots) = state
        .view
        .state_root_batch_with_children(BatchSelector::Latest)?;
    Ok(Json(StateRootBatchResponse { batch, state_roots }))
}

async fn state_root_batch_by_index(
    State(state): State<ApiState>,
    Path(index): Path<String>,
) -> Result<Json<StateRootBatchResponse>, ApiError> {
    let index = parse_index(&index)?;
    let (batch, state_roots) = state
        .view
        .state_root_batch_with_children(BatchSelector::Index(index))?;
    Ok(Json(StateRootBatchResponse { batch, state_roots }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ferry_index::{
        IndexResult, PersistentRecordStore, QueueOrigin, RecordStore, Tier,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixedChainClient {
        tip: u64,
    }

    #[async_trait]
    impl RemoteChainClient for FixedChainClient {
        async fn tip_height(&self) -> IndexResult<u64> {
            Ok(self.tip)
        }

        async fn block_by_number(&self, number: u64) -> IndexResult<Option<BlockContext>> {
            if number > self.tip {
                return Ok(None);
            }
            Ok(Some(BlockContext {
                number,
                timestamp: 1_000 + number,
                hash: B256::repeat_byte(number as u8),
            }))
        }
    }

    fn tx(index: u64, batch_index: Option<u64>) -> IndexedTransaction {
        IndexedTransaction {
            index,
            batch_index,
            block_number: 100 + index,
            timestamp: 1_000 + index,
            gas_limit: 21_000,
            target: Address::repeat_byte(0x01),
            origin: None,
            data: Bytes::new(),
            queue_origin: QueueOrigin::Sequencer,
            queue_index: None,
            value: U256::ZERO,
        }
    }

    fn app_with(store: PersistentRecordStore, tip: u64, confirmations: u64) -> Router {
        let state = ApiState {
            view: Arc::new(IndexView::new(Arc::new(store), true)),
            chain: Arc::new(FixedChainClient { tip }),
            confirmations,
        };
        router(state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn syncing_reports_progress() {
        let store = PersistentRecordStore::in_memory().expect("store");
        store
            .put_transactions(Tier::Confirmed, &[tx(3, Some(0))])
            .expect("insert");
        store.set_highest_known_index(5).expect("advance");

        let (status, body) = get_json(app_with(store, 100, 0), "/eth/syncing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "syncing": true,
                "currentTransactionIndex": 3,
                "highestKnownTransactionIndex": 5,
            })
        );
    }

    #[tokio::test]
    async fn syncing_omits_highest_when_caught_up() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) = get_json(app_with(store, 100, 0), "/eth/syncing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("syncing"), Some(&Value::Bool(false)));
        assert!(body.get("highestKnownTransactionIndex").is_none());
    }

    #[tokio::test]
    async fn context_latest_applies_confirmation_depth() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) = get_json(app_with(store, 100, 10), "/eth/context/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blockNumber"], 90);
        assert_eq!(body["timestamp"], 1_090);
    }

    #[tokio::test]
    async fn context_past_settled_tip_is_all_null() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) =
            get_json(app_with(store, 100, 10), "/eth/context/blocknumber/91").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "blockNumber": null,
                "timestamp": null,
                "blockHash": null,
            })
        );
    }

    #[tokio::test]
    async fn context_accepts_hex_block_numbers() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) =
            get_json(app_with(store, 100, 0), "/eth/context/blocknumber/0x5a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blockNumber"], 90);
    }

    #[tokio::test]
    async fn malformed_index_is_a_400_with_error_body() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) =
            get_json(app_with(store, 100, 0), "/transaction/index/notanumber").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("notanumber"));
    }

    #[tokio::test]
    async fn missing_transaction_is_null_fields_not_404() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) = get_json(app_with(store, 100, 0), "/transaction/index/9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({ "transaction": null, "batch": null })
        );
    }

    #[tokio::test]
    async fn transaction_response_pairs_record_with_batch() {
        let store = PersistentRecordStore::in_memory().expect("store");
        store
            .put_transactions(Tier::Confirmed, &[tx(0, Some(0))])
            .expect("insert tx");
        store
            .put_transaction_batches(&[TransactionBatch {
                index: 0,
                block_number: 10,
                timestamp: 500,
                submitter: Address::repeat_byte(0x02),
                size: 1,
                prev_total_elements: 0,
                root: B256::ZERO,
                extra_data: Bytes::new(),
            }])
            .expect("insert batch");

        let (status, body) = get_json(app_with(store, 100, 0), "/transaction/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transaction"]["index"], 0);
        assert_eq!(body["batch"]["index"], 0);
        assert_eq!(body["batch"]["prevTotalElements"], 0);
    }

    #[tokio::test]
    async fn unconfirmed_transaction_serves_null_batch() {
        let store = PersistentRecordStore::in_memory().expect("store");
        store
            .put_transactions(Tier::Unconfirmed, &[tx(4, None)])
            .expect("insert");

        let (status, body) = get_json(app_with(store, 100, 0), "/transaction/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transaction"]["index"], 4);
        assert_eq!(body["batch"], Value::Null);
    }

    #[tokio::test]
    async fn absent_batch_reconstruction_is_empty_not_error() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) =
            get_json(app_with(store, 100, 0), "/batch/stateroot/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({ "batch": null, "stateRoots": [] })
        );
    }

    #[tokio::test]
    async fn incomplete_batch_surfaces_as_400() {
        let store = PersistentRecordStore::in_memory().expect("store");
        // Header declares 2 children, none stored.
        store
            .put_transaction_batches(&[TransactionBatch {
                index: 0,
                block_number: 10,
                timestamp: 500,
                submitter: Address::repeat_byte(0x02),
                size: 2,
                prev_total_elements: 0,
                root: B256::ZERO,
                extra_data: Bytes::new(),
            }])
            .expect("insert batch");

        let (status, body) =
            get_json(app_with(store, 100, 0), "/batch/transaction/index/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("declares"));
    }

    #[tokio::test]
    async fn enqueue_route_fills_ctc_index() {
        let store = PersistentRecordStore::in_memory().expect("store");
        store
            .put_enqueue_entries(&[EnqueueEntry {
                index: 7,
                target: Address::repeat_byte(0xab),
                data: Bytes::new(),
                gas_limit: 21_000,
                origin: Address::repeat_byte(0xcd),
                block_number: 50,
                timestamp: 1_000,
                ctc_index: None,
            }])
            .expect("insert");
        store.set_ctc_index(7, 42).expect("pin");

        let (status, body) = get_json(app_with(store, 100, 0), "/enqueue/index/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], 7);
        assert_eq!(body["ctcIndex"], 42);
    }

    struct FailingChainClient;

    #[async_trait]
    impl RemoteChainClient for FailingChainClient {
        async fn tip_height(&self) -> IndexResult<u64> {
            Err(ferry_index::IndexError::Upstream(
                "eth_blockNumber request failed: connection refused".to_string(),
            ))
        }

        async fn block_by_number(&self, _number: u64) -> IndexResult<Option<BlockContext>> {
            Err(ferry_index::IndexError::Upstream(
                "eth_getBlockByNumber request failed: connection refused".to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_400() {
        let state = ApiState {
            view: Arc::new(IndexView::new(
                Arc::new(PersistentRecordStore::in_memory().expect("store")),
                true,
            )),
            chain: Arc::new(FailingChainClient),
            confirmations: 0,
        };

        let (status, body) = get_json(router(state), "/eth/context/latest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .expect("message")
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn missing_enqueue_is_null_body() {
        let store = PersistentRecordStore::in_memory().expect("store");
        let (status, body) = get_json(app_with(store, 100, 0), "/enqueue/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }
}
