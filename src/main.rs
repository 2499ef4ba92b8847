use actix_web::{App, HttpServer, middleware};
use std::sync::Arc;

use impactflow::app::AppServices;
use impactflow::config::AppConfig;
use impactflow::db;
use impactflow::models::setting::{FileSettingsRepository, SettingsRepository};
use impactflow::models::workflow::{MemoryStore, PgStore, WorkflowStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let store: Arc<dyn WorkflowStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url).await.map_err(std::io::Error::other)?;
            db::run_migrations(&pool).await.map_err(std::io::Error::other)?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            log::warn!("No DATABASE_URL set, workflows are kept in memory (lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_demo {
        db::seed_demo(store.as_ref())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
    }

    let settings: Arc<dyn SettingsRepository> =
        Arc::new(FileSettingsRepository::new(config.settings_path.clone()));
    // Fail fast on an unreadable or too-new settings document.
    settings
        .load()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let services = AppServices::new(store, settings, config.actors.clone());

    log::info!(
        "Starting server at http://{} ({} API tokens)",
        config.bind_addr,
        config.actors.len()
    );

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(move |cfg| services.configure(cfg))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
