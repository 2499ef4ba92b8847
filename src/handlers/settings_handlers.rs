use actix_web::{web, HttpResponse};

use crate::audit;
use crate::auth::Actor;
use crate::errors::AppError;
use crate::models::setting::{AdminSettings, CURRENT_VERSION, SettingsRepository};

/// GET /api/settings
pub async fn read(settings: web::Data<dyn SettingsRepository>) -> Result<HttpResponse, AppError> {
    let current = settings.load().await?;
    Ok(HttpResponse::Ok().json(current))
}

/// PUT /api/settings - Replace the whole document (administrators only)
pub async fn save(
    settings: web::Data<dyn SettingsRepository>,
    actor: web::ReqData<Actor>,
    body: web::Json<AdminSettings>,
) -> Result<HttpResponse, AppError> {
    if !actor.is_admin() {
        return Err(AppError::PermissionDenied("settings.manage".to_string()));
    }

    let mut updated = body.into_inner();
    updated.version = CURRENT_VERSION;
    settings.save(&updated).await?;

    let details = serde_json::json!({ "version": updated.version, "summary": "Settings updated" });
    audit::log(&actor, "settings.updated", "settings", "admin", details);

    Ok(HttpResponse::Ok().json(updated))
}
