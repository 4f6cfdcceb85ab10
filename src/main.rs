//! Acórdão Drafter - turns a judgment, appeals and responses into a draft ruling.

mod composer;
mod config;
mod documents;
mod error;
mod extractor;
mod model;
mod render;
mod response_parser;
mod schema;
mod segmenter;
mod table;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use composer::DocumentBlock;
use config::ServiceConfig;
use documents::{CaseUpload, SourceDocument};
use error::{ExtractionError, ServiceFailure};
use extractor::Extractor;
use model::gemini::GeminiClient;
use schema::{CaseData, CaseRecord};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Header a caller can use to supply its own model credential.
const API_KEY_HEADER: &str = "x-api-key";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    cases: Arc<RwLock<HashMap<String, CaseRecord>>>,
    config: Arc<ServiceConfig>,
    http: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "acordao_drafter=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    info!(
        "Model: {} (max output tokens: {}), default key configured: {}",
        config.model,
        config.max_output_tokens,
        config.api_key.is_some()
    );

    let bind_addr = config.bind_addr.clone();
    let body_limit = config.max_upload_bytes;

    let state = AppState {
        cases: Arc::new(RwLock::new(HashMap::new())),
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };

    let app = router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with its layers.
fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_case))
        .route("/cases/:id", get(get_case).put(update_case).delete(delete_case))
        .route("/cases/:id/document", get(export_case))
        .route("/document", post(export_document))
        .route("/document/preview", post(preview_document))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Failures surfaced by the HTTP layer.
#[derive(Debug)]
enum ApiError {
    Extraction(ExtractionError),
    BadRequest(String),
    NotFound(String),
    Render(anyhow::Error),
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Extraction(e) => return e.into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Processo não encontrado: {}", id),
            ),
            Self::Render(e) => {
                error!("Document rendering failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "render_failed",
                    "Não foi possível gerar o documento.".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Upload the case documents and extract the structured draft data.
async fn extract_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<CaseRecord>, ApiError> {
    let mut upload = CaseUpload::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let slot = documents::parse_pair_field(&name).map(|(slot, id)| (slot, id.to_string()));
        if name != "sentence" && slot.is_none() {
            warn!("Ignoring unknown multipart field: {}", name);
            continue;
        }

        let filename = field.file_name().unwrap_or("document").to_string();
        let declared_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
            .to_vec();

        if data.is_empty() {
            warn!("Skipping empty upload in field {}", name);
            continue;
        }

        let document = SourceDocument::new(filename, declared_type.as_deref(), data)?;
        info!(
            "Received {}: {} ({} bytes, {}, sha256 {})",
            name,
            document.filename,
            document.data.len(),
            document.mime_type,
            document.digest()
        );

        match slot {
            Some((slot, pair_id)) => upload.insert(slot, &pair_id, document),
            None => upload.sentence = Some(document),
        }
    }

    upload.validate()?;
    let Some(sentence) = upload.sentence.as_ref() else {
        return Err(ApiError::BadRequest("Missing judgment".to_string()));
    };

    let api_key = resolve_api_key(&headers, &state.config)?;

    let client = GeminiClient::new(state.http.clone(), api_key, state.config.model.clone());
    let extractor = Extractor::new(&client, &state.config.prompts, state.config.max_output_tokens);
    let data = extractor.extract(sentence, upload.pairs()).await?;

    let record = CaseRecord::new(upload.filenames(), data);
    state
        .cases
        .write()
        .await
        .insert(record.id.clone(), record.clone());

    info!("Case stored: {}", record.id);
    Ok(Json(record))
}

/// Get a case for review.
async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseRecord>, ApiError> {
    let cases = state.cases.read().await;
    cases.get(&id).cloned().map(Json).ok_or(ApiError::NotFound(id))
}

/// Replace a case's data with the reviewer's edited version.
async fn update_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<CaseData>,
) -> Result<Json<CaseRecord>, ApiError> {
    let mut cases = state.cases.write().await;
    let record = cases.get_mut(&id).ok_or_else(|| ApiError::NotFound(id.clone()))?;
    record.update(data);
    info!("Case updated: {}", id);
    Ok(Json(record.clone()))
}

/// Discard a case.
async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.cases.write().await.remove(&id) {
        Some(_) => {
            info!("Case discarded: {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(id)),
    }
}

/// Export a stored case as a `.docx` draft.
async fn export_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let data = {
        let cases = state.cases.read().await;
        cases
            .get(&id)
            .map(|record| record.data.clone())
            .ok_or_else(|| ApiError::NotFound(id.clone()))?
    };
    docx_response(&data).await
}

/// Export posted case data as a `.docx` draft without storing it.
async fn export_document(Json(data): Json<CaseData>) -> Result<Response, ApiError> {
    docx_response(&data).await
}

/// The composed block sequence, for previewing the draft.
async fn preview_document(Json(data): Json<CaseData>) -> Json<Vec<DocumentBlock>> {
    Json(composer::compose(&data))
}

// ============================================================================
// Helper functions
// ============================================================================

/// The caller's `x-api-key` wins; a missing or blank header falls back to the
/// configured key.
fn resolve_api_key(headers: &HeaderMap, config: &ServiceConfig) -> Result<String, ExtractionError> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| config.api_key.clone())
        .ok_or_else(|| ExtractionError::from(ServiceFailure::missing_key()))
}

async fn docx_response(data: &CaseData) -> Result<Response, ApiError> {
    let blocks = composer::compose(data);
    let block_count = blocks.len();

    let bytes = tokio::task::spawn_blocking(move || render::to_docx(&blocks))
        .await
        .map_err(|e| ApiError::Render(anyhow::anyhow!("Render task failed: {}", e)))?
        .map_err(ApiError::Render)?;

    info!("Rendered draft: {} blocks, {} bytes", block_count, bytes.len());

    let disposition = format!("attachment; filename=\"{}\"", render::EXPORT_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, render::DOCX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
