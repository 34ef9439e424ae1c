use std::sync::Arc;

use log::{error, info, warn};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};

use notify_core::Config;

use crate::auth::refresher::TokenRefresher;
use crate::error::SendError;
use crate::store::TokenStore;

/// Provider error code meaning the access token is no longer valid. Only
/// this code triggers the refresh-and-retry path.
pub const EXPIRY_SENTINEL: i64 = -401;

const MEMO_SEND_PATH: &str = "/v2/api/talk/memo/default/send";

/// Result of one `send` call. Never persisted; `final_error` is set exactly
/// when `delivered` is false.
#[derive(Debug)]
pub struct NotificationOutcome {
    pub delivered: bool,
    pub retried: bool,
    pub final_error: Option<SendError>,
}

impl NotificationOutcome {
    fn delivered(retried: bool) -> Self {
        NotificationOutcome {
            delivered: true,
            retried,
            final_error: None,
        }
    }

    fn failed(retried: bool, error: SendError) -> Self {
        NotificationOutcome {
            delivered: false,
            retried,
            final_error: Some(error),
        }
    }
}

/// Provider verdict on a single delivery attempt that made it onto the wire.
/// `error_code` is the provider's `code` field; only its presence with the
/// expiry sentinel triggers refresh-and-retry.
enum Attempt {
    Accepted,
    Rejected {
        result_code: i64,
        error_code: Option<i64>,
    },
}

/// Sends "memo to self" text messages, refreshing the access token at most
/// once per call when the provider signals expiry.
#[derive(Debug)]
pub struct Notifier {
    client: Arc<ClientWithMiddleware>,
    store: Arc<dyn TokenStore>,
    refresher: TokenRefresher,
    api_base_url: String,
    link_url: String,
}

impl Notifier {
    pub fn new(
        client: Arc<ClientWithMiddleware>,
        store: Arc<dyn TokenStore>,
        refresher: TokenRefresher,
        config: &Config,
    ) -> Self {
        Notifier {
            client,
            store,
            refresher,
            api_base_url: config.api_base_url.clone(),
            link_url: config.link_url.clone(),
        }
    }

    /// Deliver `text`. All failures are folded into the outcome; this never
    /// returns `Err` and never panics, so a delivery failure cannot take the
    /// surrounding run down with it.
    ///
    /// At most one refresh and one retried send happen per call. The retry is
    /// an explicit second step, not a re-entry into `send`.
    pub async fn send(&self, text: &str) -> NotificationOutcome {
        let record = match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                error!("Cannot send notification, credentials unavailable: {e}");
                return NotificationOutcome::failed(false, SendError::CredentialsUnavailable);
            }
        };
        let access_token = match record.access_token() {
            Some(token) => token.to_string(),
            None => {
                error!("Stored record has no access token");
                return NotificationOutcome::failed(false, SendError::CredentialsUnavailable);
            }
        };

        let first = match self.post_message(&access_token, text).await {
            Ok(attempt) => attempt,
            Err(e) => {
                error!("Notification transport failure: {e}");
                return NotificationOutcome::failed(false, SendError::Transport(e));
            }
        };

        match first {
            Attempt::Accepted => {
                info!("Notification delivered");
                NotificationOutcome::delivered(false)
            }
            Attempt::Rejected {
                error_code: Some(EXPIRY_SENTINEL),
                ..
            } => {
                warn!("Access token expired, refreshing and retrying once");
                let new_token = match self.refresher.refresh().await {
                    Ok(token) => token,
                    Err(e) => {
                        error!("Token refresh failed: {e}");
                        return NotificationOutcome::failed(true, SendError::RefreshFailed(e));
                    }
                };
                match self.post_message(&new_token, text).await {
                    Ok(Attempt::Accepted) => {
                        info!("Notification delivered after token refresh");
                        NotificationOutcome::delivered(true)
                    }
                    Ok(Attempt::Rejected { result_code, .. }) => {
                        error!("Retried send rejected (result_code {result_code})");
                        NotificationOutcome::failed(true, SendError::RetryRejected)
                    }
                    Err(e) => {
                        error!("Retried send transport failure: {e}");
                        NotificationOutcome::failed(true, SendError::Transport(e))
                    }
                }
            }
            Attempt::Rejected {
                result_code,
                error_code,
            } => {
                let code = error_code.unwrap_or(result_code);
                error!("Notification rejected by provider (code {code}), not retrying");
                NotificationOutcome::failed(false, SendError::ProviderRejected(code))
            }
        }
    }

    /// One POST to the memo endpoint. `Err` covers everything that kept us
    /// from reading a provider verdict: network failure, non-JSON body,
    /// missing result_code.
    async fn post_message(&self, access_token: &str, text: &str) -> Result<Attempt, String> {
        let template_object = json!({
            "object_type": "text",
            "text": text,
            "link": {
                "web_url": self.link_url,
                "mobile_web_url": self.link_url,
            },
        });
        let params = [("template_object", template_object.to_string())];

        let response = self
            .client
            .post(format!("{}{}", self.api_base_url, MEMO_SEND_PATH))
            .header("Authorization", format!("Bearer {access_token}"))
            .form(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body = response.json::<Value>().await.map_err(|e| e.to_string())?;

        match body.get("result_code").and_then(Value::as_i64) {
            Some(0) => Ok(Attempt::Accepted),
            Some(result_code) => Ok(Attempt::Rejected {
                result_code,
                error_code: body.get("code").and_then(Value::as_i64),
            }),
            None => Err(format!("response missing result_code: {body}")),
        }
    }
}
