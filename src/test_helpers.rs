//! Shared test fixtures: scripted fetchers and loaders, record builders.
//!
//! The fakes stand in for [`crate::fetch::DocumentFetcher`] so resolver tests
//! never touch the network. Each records what it was asked for.

use crate::thumbnail::{ImageLoader, LoadOutcome};
use crate::types::WorkRecord;
use crate::works::{FetchError, WorksFetcher};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

// =========================================================================
// Records
// =========================================================================

/// Build a record with no description.
pub fn work(title: &str, url: &str, thumb: Option<&str>) -> WorkRecord {
    WorkRecord {
        title: title.to_string(),
        url: url.to_string(),
        desc: None,
        thumb: thumb.map(str::to_string),
    }
}

/// A JSON array of records with the given titles.
pub fn works_json(titles: &[&str]) -> String {
    let items: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| {
            serde_json::json!({
                "title": t,
                "url": format!("https://ex.com/{}", t.to_lowercase().replace(' ', "-")),
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

// =========================================================================
// Works fetcher
// =========================================================================

#[derive(Clone)]
enum FetchReply {
    Body(String),
    Status(u16),
    Transport,
}

/// A [`WorksFetcher`] that always gives the same reply and counts calls.
#[derive(Clone)]
pub struct FakeFetcher {
    reply: FetchReply,
    calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    fn with(reply: FetchReply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Successful response with this body.
    pub fn ok(body: &str) -> Self {
        Self::with(FetchReply::Body(body.to_string()))
    }

    /// Non-success status.
    pub fn status(code: u16) -> Self {
        Self::with(FetchReply::Status(code))
    }

    /// Connection-level failure.
    pub fn transport_error() -> Self {
        Self::with(FetchReply::Transport)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorksFetcher for FakeFetcher {
    async fn fetch_text(&self, _url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            FetchReply::Body(body) => Ok(body.clone()),
            FetchReply::Status(code) => Err(FetchError::Status(*code)),
            FetchReply::Transport => Err(FetchError::Transport("connection refused".into())),
        }
    }
}

// =========================================================================
// Image loader
// =========================================================================

/// An [`ImageLoader`] where only the listed locations load.
pub struct ScriptedLoader {
    loadable: HashSet<String>,
    tried: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn loading(locations: &[&str]) -> Self {
        Self {
            loadable: locations.iter().map(|s| s.to_string()).collect(),
            tried: Mutex::new(Vec::new()),
        }
    }

    /// Every location attempted, in order.
    pub fn tried(&self) -> Vec<String> {
        self.tried.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageLoader for ScriptedLoader {
    async fn load(&self, location: &str) -> LoadOutcome {
        self.tried.lock().unwrap().push(location.to_string());
        if self.loadable.contains(location) {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        }
    }
}
