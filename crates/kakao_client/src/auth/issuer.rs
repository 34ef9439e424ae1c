use std::sync::Arc;

use log::info;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use url::Url;

use notify_core::Config;

use crate::error::AuthError;
use crate::store::{TokenRecord, TokenStore};

/// One-time exchange of an authorization code for the initial token record.
///
/// The code itself is obtained out of band: the user opens `login_url()` in a
/// browser, approves, and pastes the resulting redirect URL back in.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    client: Arc<ClientWithMiddleware>,
    store: Arc<dyn TokenStore>,
    client_id: String,
    redirect_uri: String,
    auth_base_url: String,
}

impl TokenIssuer {
    pub fn new(
        client: Arc<ClientWithMiddleware>,
        store: Arc<dyn TokenStore>,
        client_id: String,
        config: &Config,
    ) -> Self {
        TokenIssuer {
            client,
            store,
            client_id,
            redirect_uri: config.redirect_uri.clone(),
            auth_base_url: config.auth_base_url.clone(),
        }
    }

    /// The interactive authorization URL the user must visit.
    pub fn login_url(&self) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&scope=talk_message",
            self.auth_base_url, self.client_id, self.redirect_uri
        )
    }

    /// Pull the `code` query parameter out of the pasted redirect URL.
    /// Fails before any network call when the parameter is missing.
    pub fn extract_code(redirect_url: &str) -> Result<String, AuthError> {
        let parsed = Url::parse(redirect_url.trim()).map_err(|_| AuthError::MalformedRedirect)?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MalformedRedirect)
    }

    /// Exchange the authorization code inside `redirect_url` for a token
    /// record, persisting the full provider response on success.
    pub async fn issue(&self, redirect_url: &str) -> Result<TokenRecord, AuthError> {
        let code = Self::extract_code(redirect_url)?;

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code", code.as_str()),
        ];
        let response = self
            .client
            .post(format!("{}/oauth/token", self.auth_base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if let Some(record) = TokenRecord::from_value(body.clone()) {
            if record.access_token().is_some() {
                self.store.save(&record)?;
                info!("Token issued and persisted");
                return Ok(record);
            }
        }
        Err(AuthError::ExchangeRejected {
            raw: body.to_string(),
        })
    }
}
