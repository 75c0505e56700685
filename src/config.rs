//! Server configuration
//!
//! Everything is settable from the command line or environment; secrets only
//! make sense as environment variables in deployment.

use clap::Parser;

/// Portfolio backend server
#[derive(Parser, Debug, Clone)]
#[command(name = "folio-server")]
#[command(about = "Portfolio backend API: blog, comments, testimonials, contact", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address to bind the HTTP server on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Directory for uploaded images
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: String,

    /// Admin login username
    #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Admin login password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    /// Secret used to sign admin session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// SMTP relay host for contact notifications
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// SMTP username, also the notification From address
    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: String,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: String,

    /// Recipient of contact form notifications
    #[arg(long, env = "CONTACT_RECIPIENT")]
    pub contact_recipient: String,

    /// Redis connection URL for the shared preview cache tier (optional)
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Link preview cache TTL in seconds
    #[arg(long, env = "PREVIEW_TTL_SECS", default_value_t = 60 * 60)]
    pub preview_ttl_secs: u64,

    /// Link preview local cache capacity
    #[arg(long, env = "PREVIEW_CACHE_CAPACITY", default_value_t = 1000)]
    pub preview_cache_capacity: usize,

    /// Public base URL of the site, used for sitemap pings
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,

    /// Search engine ping endpoint (skipped when unset)
    #[arg(long, env = "PING_URL")]
    pub ping_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from([
            "folio-server",
            "--admin-password",
            "pw",
            "--jwt-secret",
            "secret",
            "--smtp-username",
            "me@example.com",
            "--smtp-password",
            "pw",
            "--contact-recipient",
            "me@example.com",
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.preview_cache_capacity, 1000);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_missing_required_args() {
        assert!(Config::try_parse_from(["folio-server"]).is_err());
    }
}
