use std::fs;

use serde::Deserialize;
use shared::domain::Subcommittee;

#[derive(Debug)]
pub struct Settings {
    pub server_bind: String,
    pub max_body_bytes: usize,
    pub subcommittees: Vec<Subcommittee>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            max_body_bytes: 64 * 1024,
            subcommittees: vec![
                Subcommittee::new(1, "Finance and Budget"),
                Subcommittee::new(2, "Legal Affairs"),
                Subcommittee::new(3, "Education"),
                Subcommittee::new(4, "Public Health"),
            ],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    max_body_bytes: Option<usize>,
    subcommittees: Option<Vec<Subcommittee>>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_config(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file_config(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileConfig>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.max_body_bytes {
        settings.max_body_bytes = v;
    }
    if let Some(v) = file_cfg.subcommittees {
        settings.subcommittees = v;
    }
}

pub(crate) fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(parsed) = var("APP__MAX_BODY_BYTES").and_then(|v| v.parse::<usize>().ok()) {
        settings.max_body_bytes = parsed;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
