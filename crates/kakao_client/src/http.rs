use std::sync::Arc;

use anyhow::anyhow;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

/// Build the shared HTTP client. Transient transport failures (connect
/// errors, 5xx) are retried by middleware; provider-level rejections come
/// back as ordinary responses and are handled by the callers.
pub fn build_retry_client() -> anyhow::Result<Arc<ClientWithMiddleware>> {
    let client = Client::builder()
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    let client = ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

    Ok(Arc::new(client))
}

/// Plain client without retry middleware, for tests that count requests.
pub fn build_plain_client() -> anyhow::Result<Arc<ClientWithMiddleware>> {
    let client = Client::builder()
        .no_proxy()
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))?;
    Ok(Arc::new(ClientBuilder::new(client).build()))
}
