//! JSON HTTP API.
//!
//! Exposes the earmark question-answering pipeline to the chat frontend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a natural-language earmark question |
//! | `POST` | `/search` | Structured keyword search with explicit filters |
//! | `POST` | `/documents/ask` | Answer from uploaded documents with citations |
//! | `POST` | `/conversation/clear` | Drop a session's message history |
//! | `GET`  | `/examples` | Starter questions for an empty chat |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `documents_disabled` (400),
//! `llm_error` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser frontend
//! can be served from anywhere.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ask::answer_question;
use crate::config::Config;
use crate::conversation::{ConversationStore, Role};
use crate::docsearch;
use crate::models::Earmark;
use crate::query;
use crate::suggest;
use crate::{db, extract::Extractor};

const DEFAULT_SESSION: &str = "default-session";

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    conversations: Arc<ConversationStore>,
    extractor: Arc<Extractor>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        conversations: Arc::new(ConversationStore::new()),
        extractor: Arc::new(Extractor::new()?),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ask", post(handle_ask))
        .route("/search", post(handle_search))
        .route("/documents/ask", post(handle_documents_ask))
        .route("/conversation/clear", post(handle_clear))
        .route("/examples", get(handle_examples))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("earmark assistant listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"bad_request"`, `"llm_error"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn documents_disabled(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "documents_disabled".to_string(),
        message: message.into(),
    }
}

fn llm_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "llm_error".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps pipeline errors to the most appropriate HTTP status. Validation and
/// configuration problems are the caller's to fix; upstream API failures are
/// a bad gateway; anything else is internal.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("must not be empty") {
        bad_request(msg)
    } else if msg.contains("vector_store_id") || msg.contains("document search is disabled") {
        documents_disabled(msg)
    } else if msg.contains("OPENAI_API_KEY")
        || msg.contains("LLM API error")
        || msg.contains("document search API error")
        || msg.contains("after retries")
    {
        llm_error(msg)
    } else {
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /examples ============

#[derive(Serialize)]
struct ExamplesResponse {
    questions: Vec<String>,
}

/// Starter questions for an empty chat state.
async fn handle_examples() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        questions: suggest::SAMPLE_QUESTIONS
            .iter()
            .map(|q| q.to_string())
            .collect(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    /// Earmark rows that matched the extracted filters.
    count: usize,
    /// Suggested follow-up questions.
    suggestions: Vec<String>,
}

/// Handler for `POST /ask`.
///
/// Runs the full pipeline: entity extraction, filtered query with fallback,
/// prompt assembly, LLM call. Conversation history for the session is folded
/// into the prompt and updated with both sides of the exchange.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let session_id = req.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());
    let history = state
        .conversations
        .context(&session_id, state.config.answer.history_messages);

    let outcome = answer_question(&state.config, &state.pool, &state.extractor, &history, &question)
        .await
        .map_err(classify_error)?;

    state.conversations.push(&session_id, Role::User, &question);
    state
        .conversations
        .push(&session_id, Role::Assistant, &outcome.answer);

    Ok(Json(AskResponse {
        answer: outcome.answer,
        count: outcome.count,
        suggestions: outcome.suggestions,
    }))
}

// ============ POST /search ============

#[derive(Deserialize, Default)]
struct SearchFilters {
    #[serde(default)]
    year: Option<i64>,
    #[serde(default)]
    member: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    filters: Option<SearchFilters>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Serialize)]
struct SearchResponse {
    data: Vec<Earmark>,
    count: usize,
}

/// Handler for `POST /search`.
///
/// Keyword search over the FTS index with optional explicit year/member
/// filters. No LLM involved; returns raw rows.
async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let filters = req.filters.unwrap_or_default();
    // A client limit outside [1, row_limit] would become LIMIT 0 or the
    // unbounded LIMIT -1 in SQLite.
    let limit = req
        .limit
        .unwrap_or(state.config.answer.row_limit)
        .clamp(1, state.config.answer.row_limit);

    let data = query::search_earmarks(
        &state.pool,
        &req.query,
        filters.year,
        filters.member.as_deref(),
        limit,
    )
    .await
    .map_err(classify_error)?;

    let count = data.len();
    Ok(Json(SearchResponse { data, count }))
}

// ============ POST /documents/ask ============

#[derive(Deserialize)]
struct DocumentsAskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct DocumentsAskResponse {
    answer: String,
    citations: Vec<docsearch::Citation>,
}

/// Handler for `POST /documents/ask`.
///
/// Answers from uploaded guidance documents via hosted file search. Returns
/// a `documents_disabled` configuration error when no vector store is set.
async fn handle_documents_ask(
    State(state): State<AppState>,
    Json(req): Json<DocumentsAskRequest>,
) -> Result<Json<DocumentsAskResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    if !state.config.documents.is_enabled() {
        return Err(documents_disabled(
            "document search is disabled: documents.vector_store_id is not set",
        ));
    }

    let result = docsearch::search_documents(&state.config, question)
        .await
        .map_err(classify_error)?;

    Ok(Json(DocumentsAskResponse {
        answer: result.answer,
        citations: result.citations,
    }))
}

// ============ POST /conversation/clear ============

#[derive(Deserialize)]
struct ClearRequest {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ClearResponse {
    success: bool,
    session_id: String,
}

/// Handler for `POST /conversation/clear`.
///
/// Drops the session's in-memory history. Clearing a session that never
/// existed still succeeds; the end state is the same.
async fn handle_clear(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Json<ClearResponse> {
    let session_id = req.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());
    state.conversations.clear(&session_id);

    Json(ClearResponse {
        success: true,
        session_id,
    })
}
