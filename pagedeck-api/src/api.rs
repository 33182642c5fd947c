use crate::config::{GhostscriptProfile, ServerConfig};
use crate::error::AppError;
use crate::ghostscript;
use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use pagedeck::operations::apply_rotations_json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Size summary sent in the `X-Compression-Info` header
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CompressionInfo {
    /// Uploaded document size in bytes
    pub input_size: usize,
    /// Returned document size in bytes
    pub output_size: usize,
    /// Whether rotations were re-applied after compression
    pub rotations_applied: bool,
    /// Compressor profile whose output was used; `None` when the upload was
    /// returned uncompressed because nothing made it smaller
    pub profile: Option<GhostscriptProfile>,
}

/// The three form fields of a compression request
#[derive(Debug, Default)]
struct CompressRequest {
    file: Option<Vec<u8>>,
    rotations: Option<String>,
    page_order: Option<String>,
}

impl CompressRequest {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut request = CompressRequest::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
        {
            let field_name = field.name().unwrap_or("").to_string();
            match field_name.as_str() {
                "file" => {
                    let data = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file data: {e}"))
                    })?;
                    request.file = Some(data.to_vec());
                }
                "rotations" | "pageOrder" => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read {field_name}: {e}"))
                    })?;
                    if field_name == "rotations" {
                        request.rotations = Some(text);
                    } else {
                        request.page_order = Some(text);
                    }
                }
                other => debug!("Ignoring form field {:?}", other),
            }
        }

        Ok(request)
    }
}

/// Build the application router with default configuration
pub fn app() -> Router {
    app_with_config(ServerConfig::default())
}

/// Build the application router
pub fn app_with_config(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    Router::new()
        .route("/api/compress", post(compress_handler))
        .route("/api/health", get(health_check))
        .with_state(Arc::new(config))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Compress an uploaded PDF and re-apply page rotations
///
/// The compressor profile is picked by upload size. An output that is not
/// smaller than the upload is retried once with a preserving profile, and
/// the upload itself is returned when that does not help either.
///
/// Rotation re-application is best effort: when the rotation fields are
/// malformed or the compressed output cannot be reopened, the compressed
/// document is returned without rotations.
pub async fn compress_handler(
    State(config): State<Arc<ServerConfig>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let request = CompressRequest::read(multipart).await?;
    let input = request
        .file
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    info!("Received {} bytes for compression", input.len());

    let ghostscript::Compressed { bytes, profile } =
        ghostscript::compress(&config.ghostscript, &config.temp_dir(), &input).await?;
    let compressed = Arc::new(bytes);

    let (body, rotations_applied) = match request.rotations {
        Some(rotations) => {
            let page_order = request.page_order.unwrap_or_else(|| "[]".to_string());
            let source = Arc::clone(&compressed);
            let rotated = tokio::task::spawn_blocking(move || {
                apply_rotations_json(&source, &rotations, &page_order)
            })
            .await;

            match rotated {
                Ok(Ok(bytes)) => (bytes, true),
                Ok(Err(e)) => {
                    warn!("Failed to re-apply rotations, returning compressed document: {}", e);
                    (unwrap_shared(compressed), false)
                }
                Err(e) => {
                    warn!("Rotation task failed, returning compressed document: {}", e);
                    (unwrap_shared(compressed), false)
                }
            }
        }
        None => (unwrap_shared(compressed), false),
    };

    let info = CompressionInfo {
        input_size: input.len(),
        output_size: body.len(),
        rotations_applied,
        profile,
    };
    let info = serde_json::to_string(&info).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"compressed.pdf\"".to_string(),
            ),
            (HeaderName::from_static("x-compression-info"), info),
        ],
        body,
    )
        .into_response())
}

fn unwrap_shared(bytes: Arc<Vec<u8>>) -> Vec<u8> {
    Arc::try_unwrap(bytes).unwrap_or_else(|shared| shared.as_ref().clone())
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pagedeck API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
