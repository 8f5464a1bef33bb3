use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/".into(),
            request_timeout_secs: 15,
        }
    }
}

impl ClientSettings {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then `portal.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(Path::new("portal.toml")) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(parsed) = file_cfg
        .get("request_timeout_secs")
        .and_then(|v| v.parse::<u64>().ok())
    {
        settings.request_timeout_secs = parsed;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PORTAL_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(parsed) = var("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        settings.request_timeout_secs = parsed;
    }
}
