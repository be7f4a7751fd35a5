//! HTTP surface of the authority.
//!
//! ```text
//! GET  /health
//! GET  /timelines
//! GET  /timelines/:id[?version=N]               -> Snapshot
//! GET  /timelines/:id/checkpoints               -> [Checkpoint]
//! POST /timelines/:id/checkpoints/:version/approve
//! POST /timelines/:id/replace-timeline          -> Committed
//! POST /timelines/:id/rollback                  -> Committed
//! POST /timelines/:id/<operation>               -> Committed
//! ```
//!
//! Failures carry an [`AuthorityError`] body so clients can rebuild the
//! typed error.

use crate::state::{StateError, WorkspaceState};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use splice_editor::{
    AuthorityError, Checkpoint, Committed, MutationRequest, ReplaceRequest, RollbackRequest,
    Snapshot,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Request header naming the actor recorded on checkpoints
pub const AUTHOR_HEADER: &str = "x-splice-author";

#[derive(Clone)]
pub struct AppState {
    workspace: Arc<RwLock<WorkspaceState>>,
    default_author: String,
}

impl AppState {
    pub fn new(workspace: Arc<RwLock<WorkspaceState>>, default_author: impl Into<String>) -> Self {
        Self {
            workspace,
            default_author: default_author.into(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WorkspaceState>, ApiError> {
        self.workspace.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WorkspaceState>, ApiError> {
        self.workspace.write().map_err(|_| poisoned())
    }

    fn actor(&self, headers: &HeaderMap) -> String {
        headers
            .get(AUTHOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_author)
            .to_string()
    }
}

fn poisoned() -> ApiError {
    ApiError(AuthorityError::Transport("workspace state poisoned".into()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/timelines", get(list_timelines))
        .route("/timelines/:id", get(get_timeline))
        .route("/timelines/:id/checkpoints", get(list_checkpoints))
        .route("/timelines/:id/checkpoints/:version/approve", post(approve_checkpoint))
        .route("/timelines/:id/:operation", post(post_operation))
        .with_state(state)
}

/// An [`AuthorityError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub AuthorityError);

impl From<AuthorityError> for ApiError {
    fn from(e: AuthorityError) -> Self {
        ApiError(e)
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthorityError::VersionConflict { .. } => StatusCode::CONFLICT,
            AuthorityError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthorityError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthorityError::Malformed(_) => StatusCode::BAD_REQUEST,
            AuthorityError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::debug!(%status, error = %self.0, "request failed");
        (status, Json(self.0)).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn list_timelines(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let workspace = state.read()?;
    Ok(Json(workspace.timeline_ids().map(str::to_string).collect()))
}

#[derive(Debug, Deserialize)]
struct VersionQuery {
    version: Option<u64>,
}

async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<Snapshot>, ApiError> {
    let workspace = state.read()?;
    Ok(Json(workspace.get(&id, query.version)?))
}

async fn list_checkpoints(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Checkpoint>>, ApiError> {
    let workspace = state.read()?;
    Ok(Json(workspace.history(&id)?.checkpoints().cloned().collect()))
}

async fn approve_checkpoint(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, u64)>,
) -> Result<Json<Checkpoint>, ApiError> {
    let mut workspace = state.write()?;
    Ok(Json(workspace.approve(&id, version)?))
}

async fn post_operation(
    State(state): State<AppState>,
    Path((id, operation)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Committed>, ApiError> {
    let actor = state.actor(&headers);
    tracing::debug!(timeline = %id, %operation, %actor, "operation request");

    let committed = match operation.as_str() {
        "replace-timeline" => {
            let request: ReplaceRequest = decode(body)?;
            state
                .write()?
                .replace(&id, request.document, request.expected_version, &actor)?
        }
        "rollback" => {
            let request: RollbackRequest = decode(body)?;
            state
                .write()?
                .rollback(&id, request.target_version, request.expected_version, &actor)?
        }
        _ => {
            let request = decode_mutation(&operation, body)?;
            state
                .write()?
                .apply(&id, &request.mutation, request.expected_version, &actor)?
        }
    };

    Ok(Json(committed))
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AuthorityError> {
    serde_json::from_value(body).map_err(|e| AuthorityError::Malformed(e.to_string()))
}

/// The route names the operation; the body may omit `op` or must agree
fn decode_mutation(operation: &str, mut body: Value) -> Result<MutationRequest, AuthorityError> {
    if let Value::Object(fields) = &mut body {
        fields
            .entry("op")
            .or_insert_with(|| Value::String(operation.replace('-', "_")));
    }

    let request: MutationRequest = decode(body)?;
    if request.mutation.name() != operation {
        return Err(AuthorityError::Malformed(format!(
            "body describes '{}' but the route is '{}'",
            request.mutation.name(),
            operation
        )));
    }
    Ok(request)
}
