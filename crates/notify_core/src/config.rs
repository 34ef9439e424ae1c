use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::paths;

const CONFIG_FILE_PATH: &str = "config.toml";

const DEFAULT_AUTH_BASE: &str = "https://kauth.kakao.com";
const DEFAULT_API_BASE: &str = "https://kapi.kakao.com";
const DEFAULT_REDIRECT_URI: &str = "https://localhost:3000/oauth";
const DEFAULT_LINK_URL: &str = "https://map.kakao.com";

fn default_auth_base() -> String {
    DEFAULT_AUTH_BASE.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_link_url() -> String {
    DEFAULT_LINK_URL.to_string()
}

fn default_token_path() -> PathBuf {
    paths::default_token_path()
}

fn default_check_urls() -> Vec<String> {
    vec![
        "https://www.google.com".to_string(),
        "https://www.github.com".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Kakao REST API key (the OAuth client id).
    pub rest_api_key: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Token endpoint host, e.g. https://kauth.kakao.com
    #[serde(default = "default_auth_base")]
    pub auth_base_url: String,
    /// Messaging endpoint host, e.g. https://kapi.kakao.com
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    /// Link target attached to every text message.
    #[serde(default = "default_link_url")]
    pub link_url: String,
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    /// URLs the site check probes for HTTP 200.
    #[serde(default = "default_check_urls")]
    pub check_urls: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rest_api_key: None,
            redirect_uri: default_redirect_uri(),
            auth_base_url: default_auth_base(),
            api_base_url: default_api_base(),
            link_url: default_link_url(),
            token_path: default_token_path(),
            check_urls: default_check_urls(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory when present, then let
    /// environment variables override individual fields.
    pub fn new() -> Self {
        let mut config = Config::default();

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(e) => log::warn!("Ignoring unparseable {CONFIG_FILE_PATH}: {e}"),
                }
            }
        }

        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("KAKAO_REST_API_KEY") {
            if !key.trim().is_empty() {
                self.rest_api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(redirect) = std::env::var("KAKAO_REDIRECT_URI") {
            self.redirect_uri = redirect;
        }
        if let Ok(auth_base) = std::env::var("KAKAO_AUTH_BASE_URL") {
            self.auth_base_url = auth_base;
        }
        if let Ok(api_base) = std::env::var("KAKAO_API_BASE_URL") {
            self.api_base_url = api_base;
        }
        if let Ok(link) = std::env::var("KAKAO_LINK_URL") {
            self.link_url = link;
        }
        if let Ok(path) = std::env::var("KAKAO_TOKEN_FILE") {
            self.token_path = PathBuf::from(path);
        }
        if let Ok(urls) = std::env::var("CHECK_URLS") {
            let parsed: Vec<String> = urls
                .split(',')
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.check_urls = parsed;
            }
        }
    }

    /// The REST API key, or a human-readable error telling the user how to
    /// provide one.
    pub fn require_api_key(&self) -> Result<&str, String> {
        self.rest_api_key.as_deref().ok_or_else(|| {
            "KAKAO_REST_API_KEY is not set. Put it in .env, config.toml, or the environment."
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_kakao() {
        let config = Config::default();
        assert_eq!(config.auth_base_url, "https://kauth.kakao.com");
        assert_eq!(config.api_base_url, "https://kapi.kakao.com");
        assert!(config.rest_api_key.is_none());
        assert_eq!(config.check_urls.len(), 2);
    }

    #[test]
    fn require_api_key_reports_missing_key() {
        let config = Config::default();
        let err = config.require_api_key().unwrap_err();
        assert!(err.contains("KAKAO_REST_API_KEY"));
    }

    #[test]
    fn toml_round_trip_preserves_overrides() {
        let toml_src = r#"
            rest_api_key = "abc123"
            auth_base_url = "http://127.0.0.1:9000"
            check_urls = ["http://127.0.0.1:9001/health"]
        "#;
        let config: Config = toml::from_str(toml_src).expect("parse config");
        assert_eq!(config.rest_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.auth_base_url, "http://127.0.0.1:9000");
        // Unspecified fields fall back to defaults.
        assert_eq!(config.api_base_url, "https://kapi.kakao.com");
        assert_eq!(config.check_urls, vec!["http://127.0.0.1:9001/health"]);
    }
}
