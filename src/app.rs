use actix_web::web;
use std::sync::Arc;

use crate::auth::ActorDirectory;
use crate::auth::rate_limit::RateLimiter;
use crate::handlers::{api, event_handlers::EventHub};
use crate::models::setting::SettingsRepository;
use crate::models::workflow::WorkflowStore;

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn WorkflowStore>,
    pub settings: Arc<dyn SettingsRepository>,
    pub actors: ActorDirectory,
    pub hub: EventHub,
    pub limiter: RateLimiter,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        settings: Arc<dyn SettingsRepository>,
        actors: ActorDirectory,
    ) -> Self {
        AppServices {
            store,
            settings,
            actors,
            hub: EventHub::new(),
            limiter: RateLimiter::default(),
        }
    }

    /// Register app data and the `/api` routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.store.clone()))
            .app_data(web::Data::from(self.settings.clone()))
            .app_data(web::Data::new(self.actors.clone()))
            .app_data(web::Data::new(self.hub.clone()))
            .app_data(web::Data::new(self.limiter.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    actix_web::HttpResponse::BadRequest().json(serde_json::json!({ "message": message })),
                )
                .into()
            }));
        api::configure(cfg);
    }
}
