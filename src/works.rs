//! Work list resolution.
//!
//! Stage 1 of the build pipeline. Decides where the list of works comes from
//! and always produces a usable, non-empty list.
//!
//! ## Source Priority
//!
//! ```text
//! restricted context (file:)          served context (http/https)
//! ───────────────────────────         ───────────────────────────
//! 1. embedded blob (non-empty)
//! 2. works.json fetch                 2. works.json fetch (cache bypass)
//! 3. embedded blob (non-empty)        3. embedded blob (non-empty)
//! 4. built-in sample                  4. built-in sample
//! ```
//!
//! A locally opened page cannot rely on same-origin fetches, so the blob
//! embedded in the page is consulted first there. Everywhere else it is the
//! last safety net before the sample.
//!
//! ## Failure Handling
//!
//! Every source failure (missing page, malformed JSON, transport error, bad
//! status, non-array body) is absorbed as "source unavailable" and the next
//! source is tried. [`WorkListResolver::resolve`] cannot fail. A single
//! warning is logged when the built-in sample is used.

use crate::config::SiteConfig;
use crate::types::WorkRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Why a network data fetch produced nothing.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is not a JSON array")]
    NotAnArray,
    #[error("unsupported location scheme: {0}")]
    UnsupportedScheme(String),
}

/// The configured data path cannot be resolved against the document location.
#[derive(Error, Debug)]
#[error("cannot resolve data path {path:?} against {location}: {source}")]
pub struct DataUrlError {
    pub path: String,
    pub location: String,
    pub source: url::ParseError,
}

/// Fetches the raw body of the network data resource.
///
/// Implementations bypass any cache and must map a non-success status to
/// [`FetchError::Status`]. Body interpretation happens in the resolver.
#[async_trait]
pub trait WorksFetcher: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

/// Execution context of the document the gallery belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentContext {
    /// No network-capable origin, e.g. a page opened straight from disk.
    Restricted,
    /// Served over http(s).
    Served,
}

impl DocumentContext {
    pub fn from_location(location: &Url) -> Self {
        match location.scheme() {
            "http" | "https" => Self::Served,
            _ => Self::Restricted,
        }
    }
}

/// Which source the resolved list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkSource {
    Embedded,
    Network,
    Sample,
}

impl std::fmt::Display for WorkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Embedded => "embedded blob",
            Self::Network => "network",
            Self::Sample => "built-in sample",
        };
        f.write_str(label)
    }
}

/// Result of a resolution: never empty.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub works: Vec<WorkRecord>,
    pub source: WorkSource,
}

/// Resolves the work list from the first available source.
///
/// All inputs are injected: the document context, the blob text read from the
/// page (if any), the data URL and the fetcher.
pub struct WorkListResolver<F> {
    context: DocumentContext,
    embedded: Option<String>,
    data_url: Url,
    fetcher: F,
}

impl<F: WorksFetcher> WorkListResolver<F> {
    pub fn new(
        context: DocumentContext,
        embedded: Option<String>,
        data_url: Url,
        fetcher: F,
    ) -> Self {
        Self {
            context,
            embedded,
            data_url,
            fetcher,
        }
    }

    pub fn context(&self) -> DocumentContext {
        self.context
    }

    pub fn data_url(&self) -> &Url {
        &self.data_url
    }

    pub async fn resolve(&self) -> Resolution {
        if self.context == DocumentContext::Restricted {
            if let Some(works) = self.embedded_works() {
                return Resolution {
                    works,
                    source: WorkSource::Embedded,
                };
            }
        }

        match self.fetch_works().await {
            Ok(works) if !works.is_empty() => {
                return Resolution {
                    works,
                    source: WorkSource::Network,
                };
            }
            Ok(_) => debug!(url = %self.data_url, "works list fetched but empty"),
            Err(e) => debug!(url = %self.data_url, error = %e, "works list unavailable"),
        }

        if let Some(works) = self.embedded_works() {
            return Resolution {
                works,
                source: WorkSource::Embedded,
            };
        }

        warn!(
            url = %self.data_url,
            "failed to load works data, showing the built-in sample"
        );
        Resolution {
            works: vec![WorkRecord::sample()],
            source: WorkSource::Sample,
        }
    }

    fn embedded_works(&self) -> Option<Vec<WorkRecord>> {
        self.embedded.as_deref().and_then(parse_embedded)
    }

    async fn fetch_works(&self) -> Result<Vec<WorkRecord>, FetchError> {
        let body = self.fetcher.fetch_text(&self.data_url).await?;
        parse_network(&body)
    }
}

/// Stage 1 manifest: the resolved work list and where it came from.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Document location the gallery was resolved for.
    pub location: String,
    pub context: DocumentContext,
    pub source: WorkSource,
    /// The network data resource that was (or would have been) fetched.
    pub data_url: String,
    pub works: Vec<WorkRecord>,
    pub config: SiteConfig,
}

/// Resolve the work list for the page at `location`.
///
/// The embedded blob is read synchronously from `config.data.page` under
/// `source_root`; a missing or unreadable page simply means "no blob".
/// The only error is a `data.path` that does not resolve to a URL.
pub async fn resolve<F: WorksFetcher>(
    source_root: &Path,
    location: &Url,
    config: SiteConfig,
    fetcher: F,
) -> Result<Manifest, DataUrlError> {
    let data_url = location
        .join(&config.data.path)
        .map_err(|source| DataUrlError {
            path: config.data.path.clone(),
            location: location.to_string(),
            source,
        })?;

    let page_path = source_root.join(&config.data.page);
    let embedded = match std::fs::read_to_string(&page_path) {
        Ok(html) => embedded_blob(&html, &config.data.embedded_id).map(str::to_string),
        Err(e) => {
            debug!(page = %page_path.display(), error = %e, "no page to read embedded works from");
            None
        }
    };

    let resolver = WorkListResolver::new(
        DocumentContext::from_location(location),
        embedded,
        data_url,
        fetcher,
    );
    let Resolution { works, source } = resolver.resolve().await;

    Ok(Manifest {
        location: location.to_string(),
        context: resolver.context(),
        source,
        data_url: resolver.data_url().to_string(),
        works,
        config,
    })
}

/// Parse an embedded blob. Accepts only a non-empty JSON array.
pub fn parse_embedded(text: &str) -> Option<Vec<WorkRecord>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;
    WorkRecord::list_from_value(&value).filter(|works| !works.is_empty())
}

/// Parse a network body. Any JSON array is accepted here, emptiness is
/// judged by the caller.
pub fn parse_network(body: &str) -> Result<Vec<WorkRecord>, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    WorkRecord::list_from_value(&value).ok_or(FetchError::NotAnArray)
}

/// Extract the text content of the `<script>` element with the given `id`.
///
/// Returns `None` when no such element exists or its content is blank.
/// Attribute values may be double-quoted, single-quoted or bare.
pub fn embedded_blob<'a>(html: &'a str, id: &str) -> Option<&'a str> {
    const OPEN: &str = "<script";
    let mut rest = html;
    while let Some(start) = find_ignore_ascii_case(rest, OPEN) {
        let after_tag = &rest[start..];
        let open_end = after_tag.find('>')?;
        let attrs = &after_tag[OPEN.len()..open_end];
        let body = &after_tag[open_end + 1..];
        let close = find_ignore_ascii_case(body, "</script")?;
        if has_id(attrs, id) {
            let content = body[..close].trim();
            return (!content.is_empty()).then_some(content);
        }
        rest = &body[close..];
    }
    None
}

/// Whether an attribute list carries exactly `id=<id>`.
///
/// Attributes are tokenized by name, so `data-id` never matches `id`.
fn has_id(attrs: &str, id: &str) -> bool {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            return false;
        }
        let name_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let mut value = None;
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (parsed, remainder) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let quoted = &after_eq[1..];
                    match quoted.find(quote) {
                        Some(end) => (&quoted[..end], &quoted[end + 1..]),
                        None => (quoted, ""),
                    }
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    after_eq.split_at(end)
                }
            };
            value = Some(parsed);
            rest = remainder;
        }

        if name.eq_ignore_ascii_case("id") && value == Some(id) {
            return true;
        }
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
