use std::sync::Arc;

use log::{info, warn};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

use notify_core::Config;

use crate::error::RefreshError;
use crate::store::{TokenRecord, TokenStore};

/// Exchanges the stored refresh token for a new access token.
///
/// This is the only self-healing path in the system. It runs lazily, when a
/// send attempt reports token expiry, never on a timer.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    client: Arc<ClientWithMiddleware>,
    store: Arc<dyn TokenStore>,
    client_id: String,
    auth_base_url: String,
}

impl TokenRefresher {
    pub fn new(
        client: Arc<ClientWithMiddleware>,
        store: Arc<dyn TokenStore>,
        client_id: String,
        config: &Config,
    ) -> Self {
        TokenRefresher {
            client,
            store,
            client_id,
            auth_base_url: config.auth_base_url.clone(),
        }
    }

    /// Renew the access token. On success the provider response is merged
    /// into the stored record (new keys overwrite, absent keys survive) and
    /// persisted before the new token is returned.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let mut record = match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                warn!("Refresh requested but no usable stored record: {e}");
                return Err(RefreshError::NoStoredCredentials);
            }
        };
        let refresh_token = record
            .refresh_token()
            .map(str::to_string)
            .ok_or(RefreshError::NoRefreshToken)?;

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        let response = self
            .client
            .post(format!("{}/oauth/token", self.auth_base_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if let Some(renewal) = TokenRecord::from_value(body.clone()) {
            if let Some(new_token) = renewal.access_token().map(str::to_string) {
                record.merge(&renewal);
                self.store.save(&record)?;
                info!("Access token refreshed");
                return Ok(new_token);
            }
        }
        Err(RefreshError::ProviderRejected {
            raw: body.to_string(),
        })
    }
}
