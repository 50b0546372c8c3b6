//! HTTP boundary for the contact-list pipeline.
//!
//! Validates the multipart upload, runs the pipeline on a blocking worker
//! and streams back the resulting zip.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/upload` | Process an uploaded spreadsheet, respond with a zip |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Upload fields
//!
//! | Field | Default | Notes |
//! |-------|---------|-------|
//! | `file` | required | `.xlsx`, `.xls`, `.csv` |
//! | `remove_duplicates` | `true` | `true/false/1/0/on/off/yes/no` |
//! | `download_type` | `separated` | `grouped` or `separated` |
//! | `chunk_size` | `100` | 1 to 1000, ignored when grouped |
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Planilha sem dados.", "details": "..." }
//! ```
//!
//! Input problems answer `422`; packaging failures answer `500` and only
//! carry the underlying message when `[server].debug` is enabled.
//!
//! # CORS
//!
//! Origins come from `[cors].allowed_origins`, read once when the router is
//! built. An empty list allows any origin. The layer wraps every route, so
//! error responses carry the same headers as successful ones.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, CorsConfig, ProcessingConfig};
use crate::error::{ErrorKind, ProcessError};
use crate::extract::{file_extension, MIME_CSV, MIME_XLS, MIME_XLSX, SPREADSHEET_EXTENSIONS};
use crate::models::{DownloadType, ProcessOptions, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::pipeline::process_upload;

/// Room for multipart framing and the small text fields on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// MIME types accepted even when the file name has no known extension.
const ACCEPTED_MIME_TYPES: &[&str] = &[MIME_XLSX, MIME_XLS, MIME_CSV, "application/csv", "text/plain"];

const GENERIC_FAILURE_DETAIL: &str = "Ocorreu um erro ao processar a requisição";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
}

/// Builds the application router. Exposed so tests can drive it in-process.
pub fn build_router(config: Arc<Config>) -> Router {
    let cors = cors_layer(&config.cors);
    let body_limit = config
        .server
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { config })
}

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_router(Arc::new(config.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        max_upload_bytes = config.server.max_upload_bytes,
        origins = config.cors.allowed_origins.len(),
        "phone list server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(86400));

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

impl AppError {
    fn from_process(err: ProcessError, debug: bool) -> Self {
        match err.kind() {
            ErrorKind::UserInput => {
                tracing::warn!(error = %err, "upload rejected");
                AppError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    body: ErrorBody {
                        error: err.public_message().to_string(),
                        details: err.details().map(serde_json::Value::String),
                    },
                }
            }
            ErrorKind::Internal => Self::internal(err.to_string(), debug),
        }
    }

    fn internal(message: String, debug: bool) -> Self {
        tracing::error!(error = %message, "upload processing failed");
        let detail = if debug {
            message
        } else {
            GENERIC_FAILURE_DETAIL.to_string()
        };
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: "Erro interno do servidor".to_string(),
                details: Some(serde_json::Value::String(detail)),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
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

// ============ POST /api/upload ============

/// The uploaded spreadsheet as received.
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Raw multipart fields before validation.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    remove_duplicates: Option<String>,
    download_type: Option<String>,
    chunk_size: Option<String>,
}

impl UploadForm {
    /// Resolves the processing options, falling back to configured defaults
    /// for omitted or blank fields.
    fn options(&self, defaults: &ProcessingConfig) -> Result<ProcessOptions, ProcessError> {
        let mut options = defaults.options();

        if let Some(raw) = non_blank(&self.remove_duplicates) {
            options.remove_duplicates = parse_flag(raw).ok_or_else(|| {
                ProcessError::InvalidOption(format!(
                    "remove_duplicates must be a boolean, got '{}'",
                    raw
                ))
            })?;
        }

        if let Some(raw) = non_blank(&self.download_type) {
            options.download_type = raw
                .parse::<DownloadType>()
                .map_err(ProcessError::InvalidOption)?;
        }

        if let Some(raw) = non_blank(&self.chunk_size) {
            let size: usize = raw.trim().parse().map_err(|_| {
                ProcessError::InvalidOption(format!("chunk_size must be an integer, got '{}'", raw))
            })?;
            if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&size) {
                return Err(ProcessError::InvalidOption(format!(
                    "chunk_size must be between {} and {}, got {}",
                    MIN_CHUNK_SIZE, MAX_CHUNK_SIZE, size
                )));
            }
            options.chunk_size = size;
        }

        Ok(options)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Accepts the spellings HTML forms and HTTP clients commonly send.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

async fn field_text(field: Field<'_>) -> Result<String, ProcessError> {
    field
        .text()
        .await
        .map_err(|e| ProcessError::InvalidUpload(e.body_text()))
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ProcessError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProcessError::InvalidUpload(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ProcessError::InvalidUpload(e.body_text()))?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "remove_duplicates" => form.remove_duplicates = Some(field_text(field).await?),
            "download_type" => form.download_type = Some(field_text(field).await?),
            "chunk_size" => form.chunk_size = Some(field_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

fn validate_upload(file: &UploadedFile, max_bytes: usize) -> Result<(), ProcessError> {
    if file.bytes.is_empty() {
        return Err(ProcessError::InvalidUpload("the file is empty".to_string()));
    }
    if file.bytes.len() > max_bytes {
        return Err(ProcessError::InvalidUpload(format!(
            "the file may not be greater than {} bytes",
            max_bytes
        )));
    }

    let known_extension = file
        .file_name
        .as_deref()
        .and_then(file_extension)
        .is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()));
    let known_mime = file.content_type.as_deref().is_some_and(|ct| {
        let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        ACCEPTED_MIME_TYPES.contains(&essence.as_str())
    });

    if known_extension || known_mime {
        Ok(())
    } else {
        Err(ProcessError::InvalidUpload(
            "the file must be a spreadsheet of type xlsx, xls or csv".to_string(),
        ))
    }
}

/// Handler for `POST /api/upload`.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let debug = state.config.server.debug;
    let fail = move |err: ProcessError| AppError::from_process(err, debug);

    let mut multipart =
        multipart.map_err(|e| fail(ProcessError::InvalidUpload(e.body_text())))?;
    let mut form = read_form(&mut multipart).await.map_err(fail)?;

    let upload = form
        .file
        .take()
        .ok_or_else(|| fail(ProcessError::InvalidUpload("the file field is required".to_string())))?;
    validate_upload(&upload, state.config.server.max_upload_bytes).map_err(fail)?;
    let options = form.options(&state.config.processing).map_err(fail)?;
    let UploadedFile {
        file_name, bytes, ..
    } = upload;

    tracing::info!(
        file = file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = bytes.len(),
        download_type = %options.download_type,
        chunk_size = options.chunk_size,
        remove_duplicates = options.remove_duplicates,
        "processing upload"
    );

    let archive = tokio::task::spawn_blocking(move || {
        process_upload(&bytes, file_name.as_deref(), &options)
    })
    .await
    .map_err(|e| AppError::internal(e.to_string(), debug))?
    .map_err(fail)?;

    let disposition = format!("attachment; filename=\"{}\"", archive.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(remove: Option<&str>, kind: Option<&str>, size: Option<&str>) -> UploadForm {
        UploadForm {
            file: None,
            remove_duplicates: remove.map(str::to_string),
            download_type: kind.map(str::to_string),
            chunk_size: size.map(str::to_string),
        }
    }

    fn upload(name: Option<&str>, content_type: Option<&str>) -> UploadedFile {
        UploadedFile {
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: b"Nome,Telefone\n".to_vec(),
        }
    }

    #[test]
    fn omitted_fields_use_defaults() {
        let opts = form(None, None, None)
            .options(&ProcessingConfig::default())
            .unwrap();
        assert_eq!(opts, ProcessOptions::default());
    }

    #[test]
    fn blank_fields_use_defaults() {
        let opts = form(Some(""), Some("  "), Some(""))
            .options(&ProcessingConfig::default())
            .unwrap();
        assert_eq!(opts, ProcessOptions::default());
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let opts = form(Some("0"), Some("grouped"), Some("250"))
            .options(&ProcessingConfig::default())
            .unwrap();
        assert!(!opts.remove_duplicates);
        assert_eq!(opts.download_type, DownloadType::Grouped);
        assert_eq!(opts.chunk_size, 250);
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let defaults = ProcessingConfig::default();
        assert!(form(Some("maybe"), None, None).options(&defaults).is_err());
        assert!(form(None, Some("zipped"), None).options(&defaults).is_err());
        assert!(form(None, None, Some("0")).options(&defaults).is_err());
        assert!(form(None, None, Some("1001")).options(&defaults).is_err());
        assert!(form(None, None, Some("ten")).options(&defaults).is_err());
    }

    #[test]
    fn upload_needs_known_extension_or_mime() {
        assert!(validate_upload(&upload(Some("lista.xlsx"), None), 1024).is_ok());
        assert!(validate_upload(&upload(Some("LISTA.CSV"), None), 1024).is_ok());
        assert!(validate_upload(&upload(Some("blob"), Some("text/csv; charset=utf-8")), 1024).is_ok());
        assert!(validate_upload(&upload(Some("photo.png"), Some("image/png")), 1024).is_err());
        assert!(validate_upload(&upload(None, None), 1024).is_err());
    }

    #[test]
    fn upload_size_is_bounded() {
        assert!(validate_upload(&upload(Some("lista.csv"), None), 4).is_err());
        let empty = UploadedFile {
            file_name: Some("lista.csv".to_string()),
            content_type: None,
            bytes: Vec::new(),
        };
        assert!(validate_upload(&empty, 1024).is_err());
    }

    #[test]
    fn internal_errors_hide_details_unless_debugging() {
        let quiet = AppError::internal("zip exploded".to_string(), false);
        assert_eq!(quiet.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            quiet.body.details,
            Some(serde_json::Value::String(GENERIC_FAILURE_DETAIL.to_string()))
        );
        let loud = AppError::internal("zip exploded".to_string(), true);
        assert_eq!(
            loud.body.details,
            Some(serde_json::Value::String("zip exploded".to_string()))
        );
    }

    #[test]
    fn user_errors_map_to_422() {
        let err = AppError::from_process(ProcessError::EmptySheet, false);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.body.error, "Planilha sem dados.");
        assert!(err.body.details.is_none());
    }
}
