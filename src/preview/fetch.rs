//! Page fetching and metadata extraction for link previews

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::CachedPreview;
use crate::error::AppError;

/// Validate and parse a preview target; only http(s) is allowed
pub fn parse_target(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url)
        .map_err(|_| AppError::Validation(format!("invalid url: {}", url)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AppError::Validation(format!(
            "invalid url protocol: {}",
            other
        ))),
    }
}

/// Fetch the page body and extract its preview metadata
///
/// The client carries the bounded timeout; a timed-out fetch aborts the
/// connection and surfaces as `AppError::Timeout`. Non-2xx responses are
/// upstream failures, not previews.
pub async fn fetch_preview(client: &Client, url: &str) -> Result<CachedPreview, AppError> {
    let target = parse_target(url)?;

    let response = client.get(target.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "failed to fetch url, status {}",
            status.as_u16()
        )));
    }

    let html = response.text().await?;
    debug!("fetched {} bytes for preview of {}", html.len(), url);
    Ok(extract_metadata(&html, &target))
}

/// Pull OpenGraph metadata out of an HTML document, with plain-tag fallbacks
pub fn extract_metadata(html: &str, page_url: &Url) -> CachedPreview {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, "meta[property=\"og:title\"]")
        .or_else(|| first_text(&doc, "title"));
    let description = meta_content(&doc, "meta[property=\"og:description\"]")
        .or_else(|| meta_content(&doc, "meta[name=\"description\"]"))
        .unwrap_or_default();
    let image = meta_content(&doc, "meta[property=\"og:image\"]")
        .or_else(|| meta_content(&doc, "meta[name=\"image\"]"))
        .map(|raw| resolve_image(&raw, page_url));

    let domain = page_url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .to_string();

    CachedPreview {
        // an untitled page still previews as its domain
        title: title.filter(|t| !t.is_empty()).unwrap_or_else(|| domain.clone()),
        description,
        image,
        url: page_url.to_string(),
        domain,
        stored_at: chrono::Utc::now(),
    }
}

/// Relative image URLs are resolved against the page URL; on failure the
/// raw value is kept as-is
fn resolve_image(raw: &str, page_url: &Url) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    match page_url.join(raw) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let content = el.value().attr("content")?.trim().to_string();
    (!content.is_empty()).then_some(content)
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
    (!text.is_empty()).then_some(text)
}
