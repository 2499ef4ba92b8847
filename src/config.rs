use std::path::PathBuf;

use crate::auth::{ADMIN_ROLE, Actor, ActorDirectory, tokens};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` keeps workflows in memory.
    pub database_url: Option<String>,
    pub settings_path: PathBuf,
    pub actors: ActorDirectory,
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!("Failed to read .env: {e}"));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind_addr = lookup("BIND_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let settings_path = lookup("SETTINGS_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string())
            .into();

        let actors = match lookup("ACTOR_TOKENS") {
            Some(spec) if !spec.trim().is_empty() => ActorDirectory::parse(&spec)?,
            _ => {
                let token = tokens::generate_token();
                log::warn!("No ACTOR_TOKENS set, generated admin token {token} (lost on restart)");
                let mut directory = ActorDirectory::default();
                directory.insert(token, Actor::new("admin", ADMIN_ROLE));
                directory
            }
        };

        let seed_demo = match lookup("SEED_DEMO").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => return Err(format!("SEED_DEMO must be true or false, got '{other}'")),
        };

        Ok(AppConfig {
            bind_addr,
            database_url,
            settings_path,
            actors,
            seed_demo,
        })
    }
}
