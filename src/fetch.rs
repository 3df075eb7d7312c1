//! Network and filesystem access for the resolvers.
//!
//! [`DocumentFetcher`] implements both [`WorksFetcher`] and [`ImageLoader`]
//! relative to a document location:
//!
//! | Location scheme | Works fetch | Image load |
//! |-----------------|-------------|------------|
//! | `http`, `https` | `GET` with cache bypass, success status, body text | `GET`, success status |
//! | `file`          | read the file | file exists |
//! | anything else   | unsupported | failed |
//!
//! Relative locations (the placeholder, a relative `thumb`) are joined onto
//! the document location first, the way the page itself would resolve them.

use crate::thumbnail::{ImageLoader, LoadOutcome};
use crate::works::{FetchError, WorksFetcher};
use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::Duration;
use url::Url;

/// Fetches data and probes images for a page at a given location.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    document: Url,
}

impl DocumentFetcher {
    /// Build a fetcher for the page at `document`.
    ///
    /// `timeout` applies per request; `None` means requests never time out.
    pub fn new(document: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            document,
        })
    }

    pub fn document(&self) -> &Url {
        &self.document
    }

    /// Resolve a location string against the document location.
    pub fn resolve(&self, location: &str) -> Option<Url> {
        Url::parse(location)
            .or_else(|_| self.document.join(location))
            .ok()
    }
}

#[async_trait]
impl WorksFetcher for DocumentFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        match url.scheme() {
            "http" | "https" => {
                let response = self
                    .client
                    .get(url.clone())
                    .header(header::CACHE_CONTROL, "no-cache, no-store")
                    .header(header::PRAGMA, "no-cache")
                    .send()
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                response
                    .text()
                    .await
                    .map_err(|e| FetchError::Transport(e.to_string()))
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| FetchError::Transport(format!("not a local path: {url}")))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| FetchError::Transport(format!("{}: {e}", path.display())))
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[async_trait]
impl ImageLoader for DocumentFetcher {
    async fn load(&self, location: &str) -> LoadOutcome {
        let Some(url) = self.resolve(location) else {
            return LoadOutcome::Failed;
        };
        let loaded = match url.scheme() {
            "http" | "https" => self
                .client
                .get(url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false),
            "file" => match url.to_file_path() {
                Ok(path) => tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false),
                Err(()) => false,
            },
            _ => false,
        };
        if loaded {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        }
    }
}
