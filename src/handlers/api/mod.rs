use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::auth::middleware::require_bearer;
use crate::handlers::{event_handlers, settings_handlers, workflow_handlers};

/// Rejects POST/PUT/DELETE requests that carry a body which is not
/// `application/json`. Bodiless mutations (start, pause, delete...) pass.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let has_body = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|len| len > 0)
            .unwrap_or_else(|| req.headers().contains_key("transfer-encoding"));

        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if has_body && !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "message": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::UnsupportedMediaType().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// GET /api/health - Liveness probe, no authentication.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Configure the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(require_bearer))
                    .service(
                        // Fixed paths BEFORE /workflows/{id}
                        web::scope("/workflows")
                            .wrap(actix_web::middleware::from_fn(require_json_content_type))
                            .route("", web::get().to(workflow_handlers::list))
                            .route("", web::post().to(workflow_handlers::create))
                            .route("/stats", web::get().to(workflow_handlers::stats))
                            .route("/my-pending-tasks", web::get().to(workflow_handlers::my_pending_tasks))
                            .route("/events", web::get().to(event_handlers::ws_connect))
                            .route("/{id}", web::get().to(workflow_handlers::read))
                            .route("/{id}", web::delete().to(workflow_handlers::delete))
                            .route("/{id}/start", web::post().to(workflow_handlers::start))
                            .route("/{id}/pause", web::post().to(workflow_handlers::pause))
                            .route("/{id}/resume", web::post().to(workflow_handlers::resume))
                            .route("/{id}/archive", web::post().to(workflow_handlers::archive))
                            .route("/{id}/steps/{index}/complete", web::post().to(workflow_handlers::complete_step))
                            .route("/{id}/steps/{index}/reject", web::post().to(workflow_handlers::reject_step))
                            .route("/{id}/steps/{index}/skip", web::post().to(workflow_handlers::skip_step)),
                    )
                    .service(
                        web::scope("/settings")
                            .wrap(actix_web::middleware::from_fn(require_json_content_type))
                            .route("", web::get().to(settings_handlers::read))
                            .route("", web::put().to(settings_handlers::save)),
                    ),
            ),
    );
}
