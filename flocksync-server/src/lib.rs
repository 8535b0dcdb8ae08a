//! Invocation surface for flocksync: the JSON response shape and the HTTP API.

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use flocksync_sync::{SyncConfig, SyncEngine, SyncError};
use flocksync_types::{SyncFailure, SyncSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Outcome of one invocation, as returned to the caller.
///
/// The wire form carries `ok`, derived from the variant: `true` for a
/// completed run, `false` for a fatal failure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub enum InvocationResponse {
    Completed {
        fetched: usize,
        upserted: usize,
        failed: usize,
        errors: Vec<SyncFailure>,
    },
    Failed {
        error: String,
        detail: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Completed {
        ok: bool,
        fetched: usize,
        upserted: usize,
        failed: usize,
        errors: Vec<SyncFailure>,
    },
    Failed {
        ok: bool,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl From<InvocationResponse> for WireResponse {
    fn from(response: InvocationResponse) -> Self {
        match response {
            InvocationResponse::Completed {
                fetched,
                upserted,
                failed,
                errors,
            } => WireResponse::Completed {
                ok: true,
                fetched,
                upserted,
                failed,
                errors,
            },
            InvocationResponse::Failed { error, detail } => WireResponse::Failed {
                ok: false,
                error,
                detail,
            },
        }
    }
}

impl TryFrom<WireResponse> for InvocationResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        match wire {
            WireResponse::Completed {
                ok: true,
                fetched,
                upserted,
                failed,
                errors,
            } => Ok(InvocationResponse::Completed {
                fetched,
                upserted,
                failed,
                errors,
            }),
            WireResponse::Failed {
                ok: false,
                error,
                detail,
            } => Ok(InvocationResponse::Failed { error, detail }),
            WireResponse::Completed { ok: false, .. } => {
                Err("completed response must have ok = true".to_string())
            }
            WireResponse::Failed { ok: true, .. } => {
                Err("failed response must have ok = false".to_string())
            }
        }
    }
}

impl InvocationResponse {
    pub fn from_summary(summary: SyncSummary) -> Self {
        InvocationResponse::Completed {
            fetched: summary.fetched,
            upserted: summary.upserted,
            failed: summary.failed,
            errors: summary.errors,
        }
    }

    /// Builds a fatal response. `detail` carries the debug form of the error
    /// outside production.
    pub fn from_error(error: &SyncError, expose_detail: bool) -> Self {
        InvocationResponse::Failed {
            error: error.to_string(),
            detail: expose_detail.then(|| format!("{error:?}")),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, InvocationResponse::Completed { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Runs one sync built from `config`.
pub async fn invoke(config: &SyncConfig) -> InvocationResponse {
    invoke_engine(SyncEngine::new(config.clone()), !config.is_production()).await
}

/// Runs `engine` on its own task and converts every outcome, including a
/// panic inside the run, into a response.
pub async fn invoke_engine(engine: SyncEngine, expose_detail: bool) -> InvocationResponse {
    match tokio::spawn(async move { engine.run().await }).await {
        Ok(Ok(summary)) => InvocationResponse::from_summary(summary),
        Ok(Err(e)) => {
            error!("Sync failed: {e}");
            InvocationResponse::from_error(&e, expose_detail)
        }
        Err(join_error) => {
            error!("Sync task aborted: {join_error}");
            InvocationResponse::Failed {
                error: "internal error".to_string(),
                detail: expose_detail.then(|| join_error.to_string()),
            }
        }
    }
}

async fn sync_handler(
    State(config): State<Arc<SyncConfig>>,
) -> (StatusCode, Json<InvocationResponse>) {
    let response = invoke(&config).await;
    (response.status_code(), Json(response))
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Build the HTTP API router with the given resolved config.
pub fn build_router(config: Arc<SyncConfig>) -> Router {
    Router::new()
        .route("/api/sync", get(sync_handler).post(sync_handler))
        .route("/healthz", get(health_handler))
        .with_state(config)
}
