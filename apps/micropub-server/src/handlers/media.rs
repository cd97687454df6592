//! Media endpoint.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};

use micropub_core::ProtocolError;
use micropub_core::ports::MediaFile;
use micropub_core::request::{self, Route};

use super::payload::read_multipart;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the multipart part carrying the upload.
const FILE_FIELD: &str = "file";

/// POST /media
pub async fn upload(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if request::classify("POST", content_type)? != Route::Multipart {
        return Err(ProtocolError::UnsupportedMediaType(
            content_type.unwrap_or_default().to_string(),
        )
        .into());
    }

    let mut body = read_multipart(&req, payload, state.max_body_size).await?;
    let Some(index) = body.files.iter().position(|f| f.field == FILE_FIELD) else {
        return Err(AppError::BadRequest(format!(
            "missing '{FILE_FIELD}' part"
        )));
    };
    let part = body.files.swap_remove(index);

    let url = state
        .media
        .upload(MediaFile {
            name: part.filename,
            content_type: part
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content: part.content,
        })
        .await
        .map_err(ProtocolError::from)?;

    tracing::info!(url = %url, "Media uploaded");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, url.as_str()))
        .finish())
}

/// GET /media/{name}
pub async fn download(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let file = state
        .media
        .download(&path.into_inner())
        .await
        .map_err(ProtocolError::from)?;

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .body(file.content))
}
