//! Search engine pings
//!
//! Fire-and-forget notifications sent after content changes so crawlers pick
//! up new posts sooner. Failures are logged and never propagated; publishing
//! must not depend on a third-party ping endpoint.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Notify a ping endpoint about a changed sitemap, without blocking the caller
pub fn ping_search_engines(client: Client, ping_url: String, sitemap_url: String) {
    tokio::spawn(async move {
        let result = tokio::time::timeout(
            PING_TIMEOUT,
            client
                .get(&ping_url)
                .query(&[("sitemap", sitemap_url.as_str())])
                .send(),
        )
        .await;

        match result {
            Ok(Ok(resp)) if resp.status().is_success() => {
                debug!("search engine ping ok: {}", ping_url);
            }
            Ok(Ok(resp)) => {
                warn!("search engine ping returned {}: {}", resp.status(), ping_url);
            }
            Ok(Err(e)) => {
                warn!("search engine ping failed: {}", e);
            }
            Err(_) => {
                warn!("search engine ping timed out: {}", ping_url);
            }
        }
    });
}
