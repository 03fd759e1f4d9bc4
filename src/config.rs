use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_EPIC_FIELD: &str = "customfield_10008";
pub const DEFAULT_CRITERIA_FIELD: &str = "customfield_10011";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_SMTP_PORT: u16 = 25;

/// On-disk configuration, managed by `jiravet config init`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub jira_base_url: Option<String>,
    #[serde(default)]
    pub jira_user: Option<String>,
    #[serde(default)]
    pub jira_token: Option<String>,
    #[serde(default)]
    pub epic_field: Option<String>,
    #[serde(default)]
    pub criteria_field: Option<String>,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_pass: Option<String>,
    #[serde(default)]
    pub mail_from: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!(
                    "invalid config file {}: {err}",
                    path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to serialize config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

/// Runtime configuration: the stored file overlaid with the process
/// environment. Resolved once in `main`; collaborators receive it at
/// construction and never read ambient state themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: Option<String>,
    pub jira_user: Option<String>,
    pub jira_token: Option<String>,
    pub epic_field: String,
    pub criteria_field: String,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, |name| env::var(name).ok())
    }

    /// Environment variables win over the stored file.
    fn resolve(stored: StoredConfig, env_var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let smtp_port = match env_var("SMTP_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::Configuration(format!("SMTP_PORT is not a valid port: '{raw}'"))
            })?,
            None => stored.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
        };

        Ok(Self {
            jira_base_url: env_var("JIRA_URL").or(stored.jira_base_url),
            jira_user: env_var("JIRA_USER").or(stored.jira_user),
            jira_token: env_var("JIRA_PASS").or(stored.jira_token),
            epic_field: stored
                .epic_field
                .unwrap_or_else(|| DEFAULT_EPIC_FIELD.to_string()),
            criteria_field: stored
                .criteria_field
                .unwrap_or_else(|| DEFAULT_CRITERIA_FIELD.to_string()),
            smtp: SmtpConfig {
                host: env_var("SMTP_HOST").or(stored.smtp_host),
                port: smtp_port,
                username: env_var("SMTP_USER").or(stored.smtp_user),
                password: env_var("SMTP_PASS").or(stored.smtp_pass),
                from: env_var("MAIL_FROM").or(stored.mail_from),
            },
        })
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("jiravet"))
        .ok_or_else(|| {
            AppError::Configuration("could not determine the user config directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn environment_overrides_the_stored_file() {
        let stored = StoredConfig {
            jira_base_url: Some("https://stored.example.com".to_string()),
            jira_user: Some("stored-user".to_string()),
            ..StoredConfig::default()
        };
        let config = AppConfig::resolve(
            stored,
            env_from(&[("JIRA_URL", "https://env.example.com")]),
        )
        .unwrap();
        assert_eq!(
            config.jira_base_url.as_deref(),
            Some("https://env.example.com")
        );
        assert_eq!(config.jira_user.as_deref(), Some("stored-user"));
    }

    #[test]
    fn custom_field_ids_default_when_unset() {
        let config = AppConfig::resolve(StoredConfig::default(), env_from(&[])).unwrap();
        assert_eq!(config.epic_field, DEFAULT_EPIC_FIELD);
        assert_eq!(config.criteria_field, DEFAULT_CRITERIA_FIELD);
        assert_eq!(config.smtp.port, 25);
    }

    #[test]
    fn malformed_smtp_port_is_rejected() {
        let result = AppConfig::resolve(
            StoredConfig::default(),
            env_from(&[("SMTP_PORT", "twenty-five")]),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
