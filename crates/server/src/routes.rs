use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tandem_core::{
    Account, AccountType, MatchSuggestion, NewTransaction, SuggestionId, SuggestionStatus,
    Transaction, TransactionId,
};
use tandem_match::MatchTuning;
use tandem_storage::{self as storage, DbPool};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub tuning: Arc<MatchTuning>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/transactions/import", post(import_transactions))
        .route("/api/suggestions", get(list_suggestions))
        .route("/api/suggestions/{id}/accept", post(accept_suggestion))
        .route("/api/suggestions/{id}/reject", post(reject_suggestion))
        .route("/api/links", post(create_link))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ── Accounts (collaborator stub: just enough to drive the engine) ────────

#[derive(Debug, Deserialize)]
struct CreateAccount {
    name: String,
    account_type: AccountType,
}

async fn create_account(
    State(state): State<AppState>,
    Json(input): Json<CreateAccount>,
) -> Result<Json<Account>, ApiError> {
    let account = storage::insert_account(&state.db, &input.name, input.account_type).await?;
    Ok(Json(account))
}

async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(storage::get_all_accounts(&state.db).await?))
}

// ── Transactions ─────────────────────────────────────────────────────────

/// A created transaction plus whatever the inline matching scan found.
#[derive(Debug, Serialize)]
struct TransactionCreated {
    transaction: Transaction,
    suggestions: Vec<MatchSuggestion>,
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<NewTransaction>,
) -> Result<Json<TransactionCreated>, ApiError> {
    let transaction = storage::insert_transaction(&state.db, &input).await?;
    let suggestions =
        storage::scan_for_matches(&state.db, transaction.id, &state.tuning).await?;
    Ok(Json(TransactionCreated {
        transaction,
        suggestions,
    }))
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    imported: usize,
    suggestions_created: usize,
}

/// Bulk ingest. All rows land before any scan runs so a batch carrying
/// both halves of a transfer still pairs up.
async fn import_transactions(
    State(state): State<AppState>,
    Json(batch): Json<Vec<NewTransaction>>,
) -> Result<Json<ImportSummary>, ApiError> {
    let mut ids = Vec::with_capacity(batch.len());
    for input in &batch {
        ids.push(storage::insert_transaction(&state.db, input).await?.id);
    }

    let mut suggestions_created = 0;
    for id in &ids {
        suggestions_created += storage::scan_for_matches(&state.db, *id, &state.tuning)
            .await?
            .len();
    }

    Ok(Json(ImportSummary {
        imported: ids.len(),
        suggestions_created,
    }))
}

async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(storage::list_transactions(&state.db).await?))
}

// ── Suggestions ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SuggestionFilter {
    status: Option<SuggestionStatus>,
}

async fn list_suggestions(
    State(state): State<AppState>,
    Query(filter): Query<SuggestionFilter>,
) -> Result<Json<Vec<MatchSuggestion>>, ApiError> {
    Ok(Json(
        storage::list_suggestions(&state.db, filter.status).await?,
    ))
}

/// The two retyped transactions an accept (or manual link) produces.
#[derive(Debug, Serialize)]
struct LinkedPair {
    transaction_a: Transaction,
    transaction_b: Transaction,
}

async fn accept_suggestion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LinkedPair>, ApiError> {
    let (a, b) = storage::accept_suggestion(&state.db, SuggestionId(id)).await?;
    Ok(Json(LinkedPair {
        transaction_a: a,
        transaction_b: b,
    }))
}

async fn reject_suggestion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchSuggestion>, ApiError> {
    Ok(Json(
        storage::reject_suggestion(&state.db, SuggestionId(id)).await?,
    ))
}

// ── Manual linking ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LinkRequest {
    transaction_a_id: i64,
    transaction_b_id: i64,
}

async fn create_link(
    State(state): State<AppState>,
    Json(input): Json<LinkRequest>,
) -> Result<Json<LinkedPair>, ApiError> {
    let (a, b) = storage::manual_link(
        &state.db,
        TransactionId(input.transaction_a_id),
        TransactionId(input.transaction_b_id),
        &state.tuning,
    )
    .await?;
    Ok(Json(LinkedPair {
        transaction_a: a,
        transaction_b: b,
    }))
}
