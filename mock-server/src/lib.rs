//! In-memory accounts API for local development and integration tests.
//!
//! Serves `/v1/organisation/accounts` with the same status codes and error
//! bodies as the real API, including optimistic concurrency on delete.
//! `/admin/faults` queues canned failure statuses that the next account
//! requests answer with, so clients can be exercised against transient
//! server errors over real HTTP.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub use axum::http::StatusCode;

pub const ACCOUNTS_ROUTE: &str = "/v1/organisation/accounts";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Account {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewAccount {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Uuid,
    pub organisation_id: Uuid,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub version: Option<i64>,
}

/// A queued failure: the next `count` account requests answer `status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fault {
    pub status: u16,
    #[serde(default = "one")]
    pub count: usize,
}

fn one() -> usize {
    1
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_message: String,
}

type ApiResponse = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (
        status,
        Json(ErrorBody {
            error_message: message.into(),
        }),
    )
}

#[derive(Clone, Default)]
pub struct AppState {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    faults: Arc<Mutex<VecDeque<StatusCode>>>,
}

impl AppState {
    /// Queue `count` responses with `status` ahead of normal handling.
    pub fn push_fault(&self, status: StatusCode, count: usize) {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        faults.extend(std::iter::repeat(status).take(count));
    }

    pub fn pending_faults(&self) -> usize {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn take_fault(&self) -> Option<StatusCode> {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    let accounts = Router::new()
        .route(ACCOUNTS_ROUTE, post(create_account))
        .route(
            &format!("{ACCOUNTS_ROUTE}/{{id}}"),
            get(fetch_account).delete(delete_account),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), inject_faults));

    Router::new()
        .merge(accounts)
        .route("/admin/faults", post(queue_fault))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "serving accounts API");
    axum::serve(listener, app_with_state(state)).await
}

async fn inject_faults(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(status) = state.take_fault() {
        debug!(%status, uri = %request.uri(), "injecting fault");
        return status.into_response();
    }
    next.run(request).await
}

async fn queue_fault(
    State(state): State<AppState>,
    Json(fault): Json<Fault>,
) -> Result<StatusCode, ApiResponse> {
    let status = StatusCode::from_u16(fault.status)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    state.push_fault(status, fault.count);
    Ok(StatusCode::NO_CONTENT)
}

async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<Envelope<NewAccount>>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Account>>), ApiResponse> {
    let Json(Envelope { data: input }) =
        payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    if input.resource_type != "accounts" {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("type must be accounts, got {:?}", input.resource_type),
        ));
    }

    let mut accounts = state.accounts.write().await;
    if accounts.contains_key(&input.id) {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Account cannot be created as it violates a duplicate constraint",
        ));
    }

    let now = Utc::now();
    let account = Account {
        resource_type: input.resource_type,
        id: input.id,
        organisation_id: input.organisation_id,
        version: 0,
        attributes: input.attributes,
        created_on: now,
        modified_on: now,
    };
    accounts.insert(account.id, account.clone());
    info!(id = %account.id, "account created");
    Ok((StatusCode::CREATED, Json(Envelope { data: account })))
}

async fn fetch_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Account>>, ApiResponse> {
    let accounts = state.accounts.read().await;
    accounts
        .get(&id)
        .cloned()
        .map(|data| Json(Envelope { data }))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("record {id} does not exist")))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, Response> {
    let version = params
        .version
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "version is required").into_response())?;

    let mut accounts = state.accounts.write().await;
    let account = accounts
        .get(&id)
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    if account.version != version {
        return Err(api_error(StatusCode::CONFLICT, "invalid version").into_response());
    }
    accounts.remove(&id);
    info!(%id, version, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
