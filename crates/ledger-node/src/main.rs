mod constants;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, ValueEnum};
use constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN, SLED_DIR, TRANSACTION_LOG_FILE};
use ledger_core::{
    constants::DEFAULT_DIFFICULTY, Block, Ledger, LedgerConfig, LedgerError, MemoryLog,
    MineOutcome, MiningBudget, TransactionLog,
};
use ledger_storage::{FileLog, SledLog};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Keep pending transactions in the ledger's own buffer
    None,
    /// In-process transaction log
    Memory,
    /// Text file under the data directory
    File,
    /// sled database under the data directory
    Sled,
}

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Data directory for the transaction log
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Leading zero hex characters required in a block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Where submitted transactions wait until mined
    #[arg(long, value_enum, default_value_t = BackendKind::File)]
    backend: BackendKind,

    /// Give up mining after this many hashes
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Give up mining after this many milliseconds
    #[arg(long)]
    max_duration_ms: Option<u64>,

    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            budget: MiningBudget {
                max_iterations: self.max_iterations,
                max_duration_ms: self.max_duration_ms,
            },
            parallel: self.parallel,
        }
    }

    fn open_backend(&self) -> anyhow::Result<Option<Arc<dyn TransactionLog>>> {
        let dir = Path::new(&self.data_dir);
        let backend: Option<Arc<dyn TransactionLog>> = match self.backend {
            BackendKind::None => None,
            BackendKind::Memory => Some(Arc::new(MemoryLog::new())),
            BackendKind::File => Some(Arc::new(FileLog::open(dir.join(TRANSACTION_LOG_FILE))?)),
            BackendKind::Sled => Some(Arc::new(SledLog::open(dir.join(SLED_DIR))?)),
        };
        Ok(backend)
    }
}

/// Handlers wait for the ledger asynchronously; only the mining worker locks it blocking.
#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<Ledger>>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Head {
    height: u64,
    hash: String,
}

#[derive(Serialize)]
struct Verified {
    valid: bool,
    height: u64,
}

#[derive(Deserialize)]
struct TxIn {
    data: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
enum ApiError {
    Ledger(LedgerError),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::ChainIntegrityViolation { .. }) => StatusCode::CONFLICT,
            ApiError::Ledger(LedgerError::BackendUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ledger(LedgerError::Backend(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Ledger(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Ledger(e) => e.to_string(),
            ApiError::Internal(msg) => msg,
        };
        warn!(%status, %error, "request failed");
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn chain_head(State(state): State<AppState>) -> Result<Json<Head>, ApiError> {
    let ledger = state.ledger.lock().await;
    let tip = ledger.last_block();
    Ok(Json(Head {
        height: tip.index(),
        hash: tip.seal_hash().to_string(),
    }))
}

async fn chain_blocks(State(state): State<AppState>) -> Result<Json<Vec<Block>>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(ledger.blocks().to_vec()))
}

async fn chain_verify(State(state): State<AppState>) -> Result<Json<Verified>, ApiError> {
    let ledger = state.ledger.lock().await;
    ledger.verify_full_block_history()?;
    Ok(Json(Verified {
        valid: true,
        height: ledger.last_block().index(),
    }))
}

async fn pending(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(ledger.pending_transactions().to_vec()))
}

async fn submit_tx(
    State(state): State<AppState>,
    Json(tx): Json<TxIn>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut ledger = state.ledger.lock().await;
    ledger.add_new_transaction(tx.data.clone())?;
    Ok(Json(serde_json::json!({ "accepted": true, "tx": tx.data })))
}

/// Proof of work blocks until a nonce is found, so it runs on the blocking pool.
async fn mine(State(state): State<AppState>) -> Result<Json<MineOutcome>, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || -> Result<MineOutcome, ApiError> {
        let mut ledger = state.ledger.blocking_lock();
        Ok(ledger.mine()?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))??;
    Ok(Json(outcome))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/chain", get(chain_blocks))
        .route("/chain/head", get(chain_head))
        .route("/chain/verify", get(chain_verify))
        .route("/pending", get(pending))
        .route("/tx", post(submit_tx))
        .route("/mine", post(mine))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let backend = args.open_backend()?;
    let config = args.ledger_config();
    let ledger = match backend {
        Some(backend) => Ledger::with_backend(config, backend)?,
        None => Ledger::new(config)?,
    };

    let state = AppState {
        ledger: Arc::new(Mutex::new(ledger)),
    };

    let addr: SocketAddr = args.listen.parse()?;
    info!(backend = ?args.backend, "ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;
    Ok(())
}
