use std::time::Duration;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

// ── Constants ────────────────────────────────────────────────────────────────

/// Desktop Chrome UA; delivery sites serve an empty shell to obvious bots.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const BASE_TIMEOUT: Duration = Duration::from_secs(10);

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("URL did not return HTML")]
    NotHtml,
    #[error("upstream returned HTTP {0}")]
    Blocked(u16),
    #[error("{0}")]
    Request(String),
}

// ── Options ──────────────────────────────────────────────────────────────────

/// Knobs for the page-fetching collaborator.
///
/// The plain HTTP client honours `user_agent` and stretches its total
/// timeout by `render_wait_ms`; `headless` and `scroll_passes` only apply
/// to browser-backed fetchers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchOptions {
    pub headless: bool,
    pub user_agent: String,
    pub render_wait_ms: u64,
    pub scroll_passes: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            render_wait_ms: 5_000,
            scroll_passes: 0,
        }
    }
}

// ── Result type ──────────────────────────────────────────────────────────────

pub struct FetchedPage {
    pub raw_html: String,
    /// Title of the document as served. A bare storefront name here usually
    /// means the menu never rendered and the request hit a bot wall.
    pub page_title: Option<String>,
}

// ── Fetch ────────────────────────────────────────────────────────────────────

pub async fn fetch(url: &str, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
    validate_url(url)?;

    let insecure = std::env::var("MENU_MINER_INSECURE_SSL").as_deref() == Ok("1");

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
            .parse()
            .unwrap(),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        "en-US,en;q=0.9".parse().unwrap(),
    );

    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(BASE_TIMEOUT + Duration::from_millis(options.render_wait_ms))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(&options.user_agent)
        .default_headers(headers);

    if insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    let client = builder
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            FetchError::Request(format!("ConnectError: {}", e))
        } else {
            FetchError::Request(format!("RequestError: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Blocked(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.contains("text/html") {
        return Err(FetchError::NotHtml);
    }

    let raw_html = response
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let page_title = page_title(&raw_html);
    tracing::debug!(url, title = ?page_title, bytes = raw_html.len(), "page fetched");

    Ok(FetchedPage { raw_html, page_title })
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed =
        Url::parse(url).map_err(|_| FetchError::InvalidUrl("Invalid URL".to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(FetchError::InvalidUrl(
            "Only http(s) URLs are allowed".to_string(),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl("URL has no host".to_string()));
    }
    Ok(())
}

// ── Title extraction ─────────────────────────────────────────────────────────

fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_sel = Selector::parse("title").unwrap();
    document
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
