use crate::config::ServerConfig;
use crate::payloads::*;
use crate::upload::{save_uploads, UploadedFile};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use docqa_rag::{AnswerGenerator, DocumentIndex, DocumentProcessor, HierarchicalIndexer, QueryService};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub const REQUIRED_FILE_COUNT: usize = 3;
const UPLOAD_FIELD: &str = "pdf_files";
const GENERATION_FAILED: &str = "Failed to generate an answer";

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub struct AppState {
    pub config: ServerConfig,
    processor: DocumentProcessor,
    indexer: HierarchicalIndexer,
    query_service: QueryService,
    index: RwLock<Option<Arc<DocumentIndex>>>,
}

impl AppState {
    pub fn new(config: ServerConfig, generator: Arc<dyn AnswerGenerator>) -> Self {
        let query_service = QueryService::new(generator, config.retrieval_mode, config.top_n);
        Self {
            config,
            processor: DocumentProcessor::new(),
            indexer: HierarchicalIndexer::new(),
            query_service,
            index: RwLock::new(None),
        }
    }

    /// Replaces the current index, e.g. with one loaded from disk.
    pub async fn set_index(&self, index: DocumentIndex) {
        let index = Arc::new(index);
        *self.index.write().await = Some(index);
    }

    /// The current index; the lock is released before the caller uses it.
    async fn current_index(&self) -> Option<Arc<DocumentIndex>> {
        self.index.read().await.clone()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index_page).post(upload_pdfs))
        .route("/ask", post(ask_question))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn upload_pdfs(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

        // Browsers send one empty part when no file was picked.
        if filename.is_empty() && bytes.is_empty() {
            continue;
        }
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No files provided"));
    }
    if files.len() != REQUIRED_FILE_COUNT {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please upload exactly three PDF files.",
        ));
    }

    let paths = save_uploads(&state.config.upload_folder, &files)
        .await
        .map_err(|e| {
            log::error!("Failed to save uploads: {:#}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save uploaded files")
        })?;
    if paths.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No PDF files provided"));
    }

    let saved: Vec<String> = paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect();

    // Extraction and indexing are CPU bound.
    let worker = state.clone();
    let index = tokio::task::spawn_blocking(move || -> anyhow::Result<DocumentIndex> {
        let documents = worker.processor.extract_text_from_pdfs(&paths)?;
        Ok(worker.indexer.build_index(&documents))
    })
    .await
    .map_err(|e| {
        log::error!("Indexing task failed: {}", e);
        api_error(StatusCode::UNPROCESSABLE_ENTITY, "Failed to read the uploaded PDF files")
    })?
    .map_err(|e| {
        log::error!("Failed to index uploads: {:#}", e);
        api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    state.set_index(index).await;
    log::info!("Indexed uploads: {:?}", saved);

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully.".to_string(),
        files: saved,
    }))
}

async fn ask_question(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let query = payload
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Query is missing"))?;

    let index = state
        .current_index()
        .await
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "No documents have been uploaded"))?;

    let answer = state.query_service.query(&query, &index).await.map_err(|e| {
        log::error!("Failed to answer '{}': {:#}", query, e);
        api_error(StatusCode::BAD_GATEWAY, GENERATION_FAILED)
    })?;

    log::info!(
        "Answered query with {} sections in {} ms",
        answer.sources.len(),
        answer.processing_time_ms
    );

    Ok(Json(AskResponse {
        answer: answer.answer,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let documents_indexed = state
        .current_index()
        .await
        .map_or(0, |index| index.documents.len());

    Json(HealthResponse {
        status: "ok".to_string(),
        documents_indexed,
    })
}
