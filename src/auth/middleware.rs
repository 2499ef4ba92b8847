use actix_web::{
    Error, HttpMessage, ResponseError, web,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use super::rate_limit::RateLimiter;
use super::ActorDirectory;
use crate::errors::AppError;

/// Middleware function that resolves the `Authorization: Bearer` token to an
/// [`Actor`](super::Actor) and stores it in the request extensions.
/// Responds 401 for a missing or unknown token, 429 once a client address
/// has failed too often.
pub async fn require_bearer(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let ip = req.peer_addr().map(|addr| addr.ip());
    let limiter = req.app_data::<web::Data<RateLimiter>>().cloned();

    if let (Some(limiter), Some(ip)) = (&limiter, ip) {
        if limiter.is_blocked(ip) {
            log::warn!("Rejecting request from throttled address {ip}");
            let response = AppError::TooManyRequests.error_response();
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    let presented = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string());

    let actor = match (req.app_data::<web::Data<ActorDirectory>>(), presented) {
        (Some(directory), Some(token)) => directory.authenticate(&token).cloned(),
        _ => None,
    };

    match actor {
        Some(actor) => {
            if let (Some(limiter), Some(ip)) = (&limiter, ip) {
                limiter.clear(ip);
            }
            req.extensions_mut().insert(actor);
            next.call(req).await.map(|res| res.map_into_left_body())
        }
        None => {
            if let (Some(limiter), Some(ip)) = (&limiter, ip) {
                limiter.record_failure(ip);
            }
            let response = AppError::Unauthorized.error_response();
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
