//! Platform-wide administration settings.
//!
//! All settings live in one versioned [`AdminSettings`] document reached
//! through a [`SettingsRepository`]. Documents written before versioning was
//! introduced (four independent blobs keyed `generalSettings`,
//! `notificationSettings`, `securitySettings` and `appearanceSettings`) are
//! upgraded on load.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
    #[error("Settings version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigestFrequency {
    Never,
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub platform_name: String,
    pub default_language: String,
    pub timezone: String,
    pub items_per_page: u32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        GeneralSettings {
            platform_name: "Impact Tracker".to_string(),
            default_language: "fr".to_string(),
            timezone: "Europe/Paris".to_string(),
            items_per_page: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub workflow_alerts: bool,
    pub digest_frequency: DigestFrequency,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            email_enabled: true,
            workflow_alerts: true,
            digest_frequency: DigestFrequency::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    pub session_timeout_minutes: u32,
    pub password_min_length: u32,
    pub require_two_factor: bool,
    pub max_login_attempts: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        SecuritySettings {
            session_timeout_minutes: 30,
            password_min_length: 8,
            require_two_factor: false,
            max_login_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub primary_color: String,
    pub compact_tables: bool,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        AppearanceSettings {
            theme: Theme::Light,
            primary_color: "#1976d2".to_string(),
            compact_tables: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub version: u32,
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub appearance: AppearanceSettings,
}

impl Default for AdminSettings {
    fn default() -> Self {
        AdminSettings {
            version: CURRENT_VERSION,
            general: GeneralSettings::default(),
            notifications: NotificationSettings::default(),
            security: SecuritySettings::default(),
            appearance: AppearanceSettings::default(),
        }
    }
}

impl AdminSettings {
    /// Parse a stored document, upgrading unversioned ones.
    pub fn from_document(doc: Value) -> Result<Self, SettingsError> {
        match doc.get("version").and_then(Value::as_u64) {
            Some(v) if v > CURRENT_VERSION as u64 => Err(SettingsError::UnsupportedVersion(v as u32)),
            Some(_) => {
                let mut settings: AdminSettings = serde_json::from_value(doc)?;
                settings.version = CURRENT_VERSION;
                Ok(settings)
            }
            None => Self::from_legacy(&doc),
        }
    }

    fn from_legacy(doc: &Value) -> Result<Self, SettingsError> {
        fn part<T: for<'de> Deserialize<'de> + Default>(doc: &Value, key: &str) -> Result<T, SettingsError> {
            match doc.get(key) {
                Some(v) if !v.is_null() => Ok(serde_json::from_value(v.clone())?),
                _ => Ok(T::default()),
            }
        }

        log::info!("Upgrading unversioned settings document to version {CURRENT_VERSION}");
        Ok(AdminSettings {
            version: CURRENT_VERSION,
            general: part(doc, "generalSettings")?,
            notifications: part(doc, "notificationSettings")?,
            security: part(doc, "securitySettings")?,
            appearance: part(doc, "appearanceSettings")?,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();
        if self.general.platform_name.trim().is_empty() {
            errors.push("platform name is required".to_string());
        }
        if !(1..=100).contains(&self.general.items_per_page) {
            errors.push("items per page must be between 1 and 100".to_string());
        }
        if self.security.session_timeout_minutes < 5 {
            errors.push("session timeout must be at least 5 minutes".to_string());
        }
        if self.security.password_min_length < 8 {
            errors.push("minimum password length must be at least 8".to_string());
        }
        if self.security.max_login_attempts == 0 {
            errors.push("max login attempts must be at least 1".to_string());
        }
        if !is_hex_color(&self.appearance.primary_color) {
            errors.push("primary color must look like #rrggbb".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Invalid(errors.join("; ")))
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Storage seam for [`AdminSettings`], injected into the handlers.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<AdminSettings, SettingsError>;

    /// Validates before persisting.
    async fn save(&self, settings: &AdminSettings) -> Result<(), SettingsError>;
}

/// Settings kept in a JSON file. A missing file yields the defaults.
pub struct FileSettingsRepository {
    path: PathBuf,
}

impl FileSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSettingsRepository { path: path.into() }
    }
}

#[async_trait]
impl SettingsRepository for FileSettingsRepository {
    async fn load(&self) -> Result<AdminSettings, SettingsError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AdminSettings::default());
            }
            Err(e) => return Err(e.into()),
        };
        AdminSettings::from_document(serde_json::from_str(&raw)?)
    }

    async fn save(&self, settings: &AdminSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Write-then-rename so readers never see a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(settings)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettingsRepository {
    settings: RwLock<AdminSettings>,
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn load(&self) -> Result<AdminSettings, SettingsError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &AdminSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        *self.settings.write().await = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        AdminSettings::default().validate().expect("defaults validate");
    }

    #[test]
    fn legacy_blobs_are_upgraded() {
        let legacy = json!({
            "generalSettings": { "platformName": "Impact Hub", "itemsPerPage": 50 },
            "securitySettings": { "sessionTimeoutMinutes": 60 },
            "appearanceSettings": null
        });
        let settings = AdminSettings::from_document(legacy).unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.general.platform_name, "Impact Hub");
        assert_eq!(settings.general.items_per_page, 50);
        assert_eq!(settings.general.timezone, "Europe/Paris");
        assert_eq!(settings.security.session_timeout_minutes, 60);
        assert_eq!(settings.security.password_min_length, 8);
        assert_eq!(settings.notifications, NotificationSettings::default());
        assert_eq!(settings.appearance, AppearanceSettings::default());
    }

    #[test]
    fn future_versions_are_refused() {
        let err = AdminSettings::from_document(json!({ "version": 99 })).unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedVersion(99)));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut settings = AdminSettings::default();
        settings.security.session_timeout_minutes = 1;
        settings.appearance.primary_color = "blue".to_string();
        match settings.validate() {
            Err(SettingsError::Invalid(msg)) => {
                assert!(msg.contains("session timeout"));
                assert!(msg.contains("primary color"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_repository_round_trip() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let repo = FileSettingsRepository::new(dir.path().join("nested/settings.json"));
        assert_eq!(repo.load().await.unwrap(), AdminSettings::default());

        let mut settings = AdminSettings::default();
        settings.appearance.theme = Theme::Dark;
        repo.save(&settings).await.expect("save");
        assert_eq!(repo.load().await.unwrap().appearance.theme, Theme::Dark);

        settings.security.password_min_length = 4;
        assert!(matches!(repo.save(&settings).await, Err(SettingsError::Invalid(_))));
        assert_eq!(repo.load().await.unwrap().security.password_min_length, 8);
    }

    #[tokio::test]
    async fn file_repository_upgrades_legacy_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r##"{"appearanceSettings": {"primaryColor": "#00ff00"}}"##).unwrap();

        let loaded = FileSettingsRepository::new(&path).load().await.unwrap();
        assert_eq!(loaded.version, CURRENT_VERSION);
        assert_eq!(loaded.appearance.primary_color, "#00ff00");
    }
}
