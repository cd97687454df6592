//! Body buffering with a size limit.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, web};
use futures::StreamExt;

use micropub_core::request::{FilePart, MultipartPayload};

use crate::middleware::error::{AppError, AppResult};

/// Buffer the whole request body, failing once it exceeds `limit` bytes.
pub async fn read_body(mut payload: web::Payload, limit: usize) -> AppResult<web::BytesMut> {
    let mut body = web::BytesMut::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Buffer a multipart body into text fields and file parts.
///
/// A part with a filename is a file; an empty file part (no file chosen in
/// a browser form) is dropped.
pub async fn read_multipart(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> AppResult<MultipartPayload> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut result = MultipartPayload::default();
    let mut total = 0usize;

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|e| AppError::BadRequest(e.to_string()))?;

        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.to_string());

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            total += chunk.len();
            if total > limit {
                return Err(AppError::PayloadTooLarge(limit));
            }
            content.extend_from_slice(&chunk);
        }

        match filename {
            Some(_) if content.is_empty() => {}
            Some(filename) => result.files.push(FilePart {
                field: name,
                filename,
                content_type,
                content,
            }),
            None => {
                let value = String::from_utf8(content)
                    .map_err(|_| AppError::BadRequest(format!("field '{name}' is not UTF-8")))?;
                result.fields.push((name, value));
            }
        }
    }

    Ok(result)
}
