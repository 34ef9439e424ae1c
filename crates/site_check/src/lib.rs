//! site_check - sequential HTTP availability checks
//!
//! The runner collaborator: probes a list of URLs for HTTP 200 and produces
//! a report the notifier turns into a message. A non-200 status counts as a
//! failure, a transport error as an error.

use std::sync::Arc;

use log::{info, warn};
use reqwest_middleware::ClientWithMiddleware;

/// Verdict of one runner pass. `success` is true iff every probe returned 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub success: bool,
    pub total: usize,
    pub failures: usize,
    pub errors: usize,
}

impl CheckReport {
    /// Human-readable summary, sent verbatim as the notification text.
    pub fn summary(&self) -> String {
        if self.success {
            format!("✅ [Site Check] All {} checks passed.", self.total)
        } else {
            format!(
                "🚨 [Site Check] Failed: {} of {} checks non-200, {} errored.",
                self.failures, self.total, self.errors
            )
        }
    }
}

#[derive(Debug)]
pub struct SiteChecker {
    client: Arc<ClientWithMiddleware>,
}

impl SiteChecker {
    pub fn new(client: Arc<ClientWithMiddleware>) -> Self {
        SiteChecker { client }
    }

    /// Probe every URL in order. Never returns an error: transport problems
    /// are counted into the report so the caller can still notify and exit
    /// with the right verdict.
    pub async fn run(&self, urls: &[String]) -> CheckReport {
        let mut failures = 0usize;
        let mut errors = 0usize;

        for url in urls {
            match self.client.get(url).send().await {
                Ok(response) if response.status().as_u16() == 200 => {
                    info!("Check OK: {url}");
                }
                Ok(response) => {
                    warn!("Check failed: {url} returned {}", response.status());
                    failures += 1;
                }
                Err(e) => {
                    warn!("Check errored: {url}: {e}");
                    errors += 1;
                }
            }
        }

        CheckReport {
            success: failures == 0 && errors == 0,
            total: urls.len(),
            failures,
            errors,
        }
    }
}
