//! Micropub endpoint.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use micropub_core::domain::Entry;
use micropub_core::request::{self, Route};
use micropub_core::source::SourceResponse;
use micropub_core::{Operation, Outcome};

use super::payload::{read_body, read_multipart};
use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Any method on /micropub.
pub async fn handle(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
    request_id: RequestId,
) -> AppResult<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let route = request::classify(req.method().as_str(), content_type)?;
    let limit = state.max_body_size;

    let operation: Operation = match route {
        Route::Source => request::parse_source(req.query_string())?,
        Route::Json => request::parse_json(&read_body(payload, limit).await?)?,
        Route::Form => request::parse_form(&read_body(payload, limit).await?)?,
        Route::Multipart => {
            request::parse_multipart(read_multipart(&req, payload, limit).await?)?
        }
    };
    let action = operation.action();

    let outcome = state.service.execute(operation).await?;

    tracing::debug!(request_id = %request_id.as_str(), action, "Micropub request handled");

    respond(outcome)
}

fn respond(outcome: Outcome) -> AppResult<HttpResponse> {
    match outcome {
        Outcome::Created(entry) => Ok(created(&entry)),
        Outcome::Moved(entry) => Ok(moved(&entry)),
        Outcome::Source(source) => json(&source),
        Outcome::Modified(entry) => json(&SourceResponse::from_entry(&entry, &[])),
        Outcome::Deleted => Ok(HttpResponse::NoContent().finish()),
    }
}

fn created(entry: &Entry) -> HttpResponse {
    let mut response = HttpResponse::Created();
    if let Some(url) = &entry.url {
        response.insert_header((header::LOCATION, url.as_str()));
    }

    if !entry.syndications.is_empty() {
        let links: Vec<String> = entry
            .syndications
            .iter()
            .map(|url| format!("<{url}>; rel=\"syndication\""))
            .collect();
        response.insert_header((header::LINK, links.join(", ")));
    }

    response.finish()
}

fn moved(entry: &Entry) -> HttpResponse {
    let mut response = HttpResponse::Created();
    if let Some(url) = &entry.url {
        response.insert_header((header::LOCATION, url.as_str()));
    }

    response.finish()
}

fn json<T: Serialize>(body: &T) -> AppResult<HttpResponse> {
    let body = serde_json::to_vec(body).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().content_type(JSON_UTF8).body(body))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};
    use url::Url;

    use crate::config::AppConfig;
    use crate::handlers::configure_routes;
    use crate::state::AppState;

    const BOUNDARY: &str = "X-MICROPUB-BOUNDARY";

    fn state() -> AppState {
        AppState::new(&AppConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            base_url: Url::parse("https://example.com/").unwrap(),
            max_body_size: 64 * 1024,
        })
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> String {
        resp.headers()
            .get("location")
            .expect("location header")
            .to_str()
            .unwrap()
            .to_string()
    }

    fn source_uri(url: &str, properties: &[&str]) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("q", "source").append_pair("url", url);
        for p in properties {
            query.append_pair("properties[]", p);
        }
        format!("/micropub?{}", query.finish())
    }

    #[actix_web::test]
    async fn test_form_create_then_source() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("h=entry&content=hello&category[]=x&category[]=y")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let url = location(&resp);
        assert!(url.starts_with("https://example.com/"));

        let req = test::TestRequest::get().uri(&source_uri(&url, &[])).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/json; charset=UTF-8"
        );

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], serde_json::json!(["h-entry"]));
        assert_eq!(body["properties"]["category"], serde_json::json!(["x", "y"]));
        assert_eq!(body["properties"]["content"], serde_json::json!(["hello"]));
    }

    #[actix_web::test]
    async fn test_json_create_emits_syndication_links() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({
                "type": ["h-entry"],
                "properties": {
                    "content": ["syndicated"],
                    "syndication": ["https://a.example/1", "https://b.example/2"]
                }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 201);
        assert_eq!(
            resp.headers().get("link").unwrap(),
            "<https://a.example/1>; rel=\"syndication\", <https://b.example/2>; rel=\"syndication\""
        );
    }

    #[actix_web::test]
    async fn test_update_in_place_and_move() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({
                "properties": {"url": ["https://example.com/post"], "category": ["a"]}
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({
                "action": "update",
                "url": "https://example.com/post",
                "add": {"category": ["b"]},
                "replace": {"category": ["c"]}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["properties"]["category"], serde_json::json!(["c"]));

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({
                "action": "update",
                "url": "https://example.com/post",
                "replace": {"url": ["https://example.com/renamed"]}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        assert_eq!(location(&resp), "https://example.com/renamed");
    }

    #[actix_web::test]
    async fn test_delete_and_undelete() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({"properties": {"url": ["https://example.com/d"]}}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("action=delete&url=https%3A%2F%2Fexample.com%2Fd")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 204);

        let req = test::TestRequest::get()
            .uri(&source_uri("https://example.com/d", &[]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "not_found");

        let req = test::TestRequest::post()
            .uri("/micropub")
            .set_json(serde_json::json!({"action": "undelete", "url": "https://example.com/d"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_rejections() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header(("content-type", "text/plain"))
            .set_payload("hello")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 415);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unsupported_media_type");

        let req = test::TestRequest::put().uri("/micropub").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 405);

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"properties\":")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_request");

        let req = test::TestRequest::get()
            .uri("/micropub?q=source")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_body_over_limit_is_rejected() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload(format!("content={}", "a".repeat(70 * 1024)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 413);
    }

    #[actix_web::test]
    async fn test_multipart_create_with_photo() {
        let app = app!();

        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"h\"\r\n\r\n\
             entry\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"content\"\r\n\r\n\
             look at this\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"sunset.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n\
             JPEGDATA\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        );

        let req = test::TestRequest::post()
            .uri("/micropub")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let url = location(&resp);

        let req = test::TestRequest::get()
            .uri(&source_uri(&url, &["photo", "content"]))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.get("type").is_none());
        assert_eq!(body["properties"]["content"], serde_json::json!(["look at this"]));

        let photo = body["properties"]["photo"][0].as_str().unwrap().to_string();
        assert!(photo.starts_with("https://example.com/media/"));
        assert!(photo.ends_with(".jpg"));

        let path = Url::parse(&photo).unwrap().path().to_string();
        let req = test::TestRequest::get().uri(&path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/jpeg");
        assert_eq!(test::read_body(resp).await, "JPEGDATA");
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!();

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }
}
