//! HTTP client utilities
//!
//! Provides a reqwest::Client configured with timeouts for outbound page
//! fetches (link previews, search engine pings).

use reqwest::Client;
use std::time::Duration;

/// Outbound page fetches give up after this long
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Build a reqwest Client with the given timeout
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("folio-server/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(client_with_timeout(DEFAULT_FETCH_TIMEOUT).is_ok());
    }
}
