//! HTTP handlers and route configuration.

mod health;
mod media;
mod micropub;
mod payload;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/health", web::get().to(health::health_check)))
        // Every method reaches the handler; it answers 405 itself.
        .service(web::resource("/micropub").to(micropub::handle))
        .service(web::resource("/media").route(web::post().to(media::upload)))
        .route("/media/{name}", web::get().to(media::download));
}
