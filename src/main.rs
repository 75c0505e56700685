//! Portfolio backend server
//!
//! HTTP API for a personal site: blog posts with image uploads, threaded
//! comments, admin-approved testimonials, a contact form with email
//! notification, reaction toggles, and cached link previews.

mod api;
mod auth;
mod blog;
mod comments;
mod config;
mod contact;
mod error;
mod http;
mod mailer;
mod media;
mod models;
mod ping;
mod preview;
mod reactions;
mod search;
mod store;
mod testimonials;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{AppState, PingTargets};
use auth::AdminAuth;
use config::Config;
use mailer::SmtpMailer;
use media::LocalMediaStore;
use preview::{PreviewCache, PreviewService, RedisTier};
use store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let state = build_state(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);

    axum::serve(listener, api::router(state))
        .await
        .context("server error")?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let uploads_root = PathBuf::from(&config.uploads_dir);
    let media = LocalMediaStore::new(uploads_root.clone(), "/uploads");

    let mailer = SmtpMailer::new(
        &config.smtp_host,
        config.smtp_port,
        &config.smtp_username,
        &config.smtp_password,
        &config.smtp_username,
    )
    .context("smtp transport setup")?;

    let remote_tier = match &config.redis_url {
        Some(url) => {
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .context("redis pool setup")?;
            info!("shared preview cache tier enabled");
            Some(Box::new(RedisTier::new(pool)) as Box<dyn preview::RemoteTier>)
        }
        None => {
            info!("no redis url configured, preview cache is local only");
            None
        }
    };
    let cache = PreviewCache::new(
        Duration::from_secs(config.preview_ttl_secs),
        config.preview_cache_capacity,
        remote_tier,
    );

    let client = http::client_with_timeout(http::DEFAULT_FETCH_TIMEOUT)
        .context("http client setup")?;
    let previews = PreviewService::new(client.clone(), cache);

    let ping = match (&config.ping_url, &config.site_url) {
        (Some(ping_url), Some(site_url)) => Some(PingTargets {
            ping_url: ping_url.clone(),
            sitemap_url: format!("{}/sitemap.xml", site_url.trim_end_matches('/')),
        }),
        (Some(_), None) => {
            warn!("ping url configured without site url, search engine pings disabled");
            None
        }
        _ => None,
    };

    Ok(AppState {
        store: Arc::new(MemoryStore::new()),
        media: Arc::new(media),
        mailer: Arc::new(mailer),
        previews: Arc::new(previews),
        auth: AdminAuth::new(
            config.admin_username.clone(),
            config.admin_password.clone(),
            config.jwt_secret.clone(),
        ),
        http: client,
        contact_recipient: config.contact_recipient.clone(),
        uploads_root,
        ping,
    })
}
