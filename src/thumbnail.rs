//! Thumbnail resolution.
//!
//! Stage 2 of the build pipeline. For every work, builds an ordered list of
//! likely thumbnail locations and probes them one at a time until one loads.
//!
//! ## Candidate Order
//!
//! ```text
//! 1. thumb                         explicit override, if non-blank
//! 2. <url> + dir + filename        for dir in directories, filename in filenames
//! 3. placeholder                   always last, so the list is never empty
//! ```
//!
//! Guesses are resolved against the work URL the way a browser resolves a
//! relative link, so `https://ex.com/p` yields `https://ex.com/og.png` and
//! `https://ex.com/p/` yields `https://ex.com/p/og.png`. A URL that cannot
//! serve as a base drops every guess for that work, never some of them.
//!
//! ## Probe State Machine
//!
//! ```text
//!            error (i < last)
//!          ┌────────────────┐
//!          ▼                │
//!   ──▶ Probing(i) ─────────┘
//!          │    │
//!     load │    │ error (i == last)
//!          ▼    ▼
//!   Resolved(i)  Exhausted        (bound to candidates[last])
//! ```
//!
//! The cursor only moves forward and at most one attempt per work is in
//! flight: the next location is only tried once the previous one failed.
//! Different works are probed concurrently.

use crate::config::{SiteConfig, ThumbnailsConfig};
use crate::types::WorkRecord;
use crate::works::{self, WorkSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{trace, warn};
use url::Url;

/// Ordered, non-empty list of thumbnail locations for one work.
///
/// Deserializing an empty list fails, so a hand-edited manifest cannot break
/// the non-empty guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CandidateList(Vec<String>);

#[derive(Error, Debug)]
#[error("thumbnail candidate list must not be empty")]
pub struct EmptyCandidateList;

impl TryFrom<Vec<String>> for CandidateList {
    type Error = EmptyCandidateList;

    fn try_from(candidates: Vec<String>) -> Result<Self, Self::Error> {
        if candidates.is_empty() {
            Err(EmptyCandidateList)
        } else {
            Ok(Self(candidates))
        }
    }
}

impl From<CandidateList> for Vec<String> {
    fn from(list: CandidateList) -> Self {
        list.0
    }
}

impl CandidateList {
    pub fn for_work(work: &WorkRecord, config: &ThumbnailsConfig) -> Self {
        let mut candidates = Vec::new();

        if let Some(thumb) = work.thumb.as_deref().map(str::trim) {
            if !thumb.is_empty() {
                candidates.push(thumb.to_string());
            }
        }

        let url = work.url.trim();
        if !url.is_empty() {
            if let Some(guesses) = guess_locations(url, config) {
                candidates.extend(guesses);
            }
        }

        candidates.push(config.placeholder.clone());
        Self(candidates)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }
}

/// Every directory × filename joined onto `base`, or `None` if any join fails.
fn guess_locations(base: &str, config: &ThumbnailsConfig) -> Option<Vec<String>> {
    let base = Url::parse(base).ok()?;
    let mut guesses = Vec::with_capacity(config.directories.len() * config.filenames.len());
    for dir in &config.directories {
        for name in &config.filenames {
            let joined = base.join(&format!("{dir}{name}")).ok()?;
            guesses.push(joined.to_string());
        }
    }
    Some(guesses)
}

/// Current state of a [`Probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Probing(usize),
    Resolved(usize),
    Exhausted,
}

/// Sequential probe over one candidate list.
///
/// Owned by exactly one driver; advanced only by load outcomes.
#[derive(Debug)]
pub struct Probe {
    candidates: CandidateList,
    cursor: usize,
    state: ProbeState,
}

impl Probe {
    pub fn new(candidates: CandidateList) -> Self {
        Self {
            candidates,
            cursor: 0,
            state: ProbeState::Probing(0),
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, ProbeState::Probing(_))
    }

    /// The location currently bound to the image.
    pub fn current(&self) -> &str {
        &self.candidates.as_slice()[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// The current location loaded. Freezes the binding.
    pub fn on_load(&mut self) {
        if let ProbeState::Probing(i) = self.state {
            self.state = ProbeState::Resolved(i);
        }
    }

    /// The current location failed to load.
    ///
    /// Returns the next location to try, or `None` when the probe is (now)
    /// terminal.
    pub fn on_error(&mut self) -> Option<&str> {
        let ProbeState::Probing(i) = self.state else {
            return None;
        };
        if i + 1 < self.candidates.len() {
            self.cursor = i + 1;
            self.state = ProbeState::Probing(self.cursor);
            Some(self.current())
        } else {
            self.state = ProbeState::Exhausted;
            None
        }
    }
}

/// Outcome of one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Attempts to load an image location.
///
/// Content is never validated: any successful response counts as loaded.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, location: &str) -> LoadOutcome;
}

/// How a work's thumbnail ended up bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailOutcome {
    /// A candidate loaded.
    Resolved,
    /// Every candidate failed, placeholder included.
    Exhausted,
    /// Not probed at build time; the page runs the cascade in the browser.
    Deferred,
}

/// Thumbnail binding for one work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailResolution {
    pub candidates: CandidateList,
    pub bound: String,
    pub outcome: ThumbnailOutcome,
    /// Number of candidates tried (0 when deferred).
    pub attempts: usize,
}

impl ThumbnailResolution {
    /// Candidates after the bound one, for the in-browser cascade.
    pub fn remaining(&self) -> &[String] {
        match self.outcome {
            ThumbnailOutcome::Deferred => &self.candidates.as_slice()[1..],
            _ => &[],
        }
    }
}

/// A work paired with its thumbnail binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbedWork {
    #[serde(flatten)]
    pub work: WorkRecord,
    pub thumbnail: ThumbnailResolution,
}

/// Progress events emitted while probing.
#[derive(Debug, Clone)]
pub enum ProbeEvent {
    Finished {
        /// 1-based position in the work list.
        index: usize,
        title: String,
        bound: String,
        outcome: ThumbnailOutcome,
        attempts: usize,
        candidate_count: usize,
    },
}

/// Drive one probe to completion, one attempt at a time.
pub async fn probe_candidates<L: ImageLoader + ?Sized>(
    candidates: CandidateList,
    loader: &L,
) -> ThumbnailResolution {
    let mut probe = Probe::new(candidates);
    let mut attempts = 0;
    while !probe.is_terminal() {
        attempts += 1;
        match loader.load(probe.current()).await {
            LoadOutcome::Loaded => probe.on_load(),
            LoadOutcome::Failed => {
                trace!(location = probe.current(), "thumbnail candidate failed");
                probe.on_error();
            }
        }
    }

    let outcome = match probe.state() {
        ProbeState::Resolved(_) => ThumbnailOutcome::Resolved,
        _ => ThumbnailOutcome::Exhausted,
    };
    ThumbnailResolution {
        bound: probe.current().to_string(),
        candidates: probe.candidates,
        outcome,
        attempts,
    }
}

/// Probe every work concurrently; results keep the input order.
///
/// A driver that dies (a panicking loader) still yields its work, bound to
/// the placeholder.
pub async fn probe_all<L: ImageLoader + 'static>(
    works: Vec<WorkRecord>,
    loader: Arc<L>,
    config: &ThumbnailsConfig,
    events: Option<Sender<ProbeEvent>>,
) -> Vec<ProbedWork> {
    let mut tasks = JoinSet::new();
    let mut pending = Vec::with_capacity(works.len());
    for (idx, work) in works.into_iter().enumerate() {
        let candidates = CandidateList::for_work(&work, config);
        pending.push((work.clone(), candidates.clone()));
        let loader = Arc::clone(&loader);
        let events = events.clone();
        tasks.spawn(async move {
            let candidate_count = candidates.len();
            let thumbnail = probe_candidates(candidates, loader.as_ref()).await;
            if let Some(tx) = &events {
                tx.send(ProbeEvent::Finished {
                    index: idx + 1,
                    title: work.title.clone(),
                    bound: thumbnail.bound.clone(),
                    outcome: thumbnail.outcome,
                    attempts: thumbnail.attempts,
                    candidate_count,
                })
                .ok();
            }
            (idx, ProbedWork { work, thumbnail })
        });
    }

    let mut slots: Vec<Option<ProbedWork>> = pending.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, probed)) => slots[idx] = Some(probed),
            Err(e) => warn!(error = %e, "thumbnail probe aborted, using the placeholder"),
        }
    }

    slots
        .into_iter()
        .zip(pending)
        .map(|(slot, (work, candidates))| {
            slot.unwrap_or_else(|| ProbedWork {
                thumbnail: ThumbnailResolution {
                    bound: candidates.last().to_string(),
                    candidates,
                    outcome: ThumbnailOutcome::Exhausted,
                    attempts: 0,
                },
                work,
            })
        })
        .collect()
}

/// Bind every work to its first candidate without probing.
pub fn defer_all(works: Vec<WorkRecord>, config: &ThumbnailsConfig) -> Vec<ProbedWork> {
    works
        .into_iter()
        .map(|work| {
            let candidates = CandidateList::for_work(&work, config);
            ProbedWork {
                thumbnail: ThumbnailResolution {
                    bound: candidates.first().to_string(),
                    candidates,
                    outcome: ThumbnailOutcome::Deferred,
                    attempts: 0,
                },
                work,
            }
        })
        .collect()
}

/// Stage 2 manifest: every work with its bound thumbnail.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub source: WorkSource,
    pub works: Vec<ProbedWork>,
    pub config: SiteConfig,
}

/// Bind a thumbnail for every work in a resolved manifest.
///
/// With a loader, candidates are probed now. Without one, every work is
/// deferred to the in-browser cascade.
pub async fn process<L: ImageLoader + 'static>(
    resolved: works::Manifest,
    loader: Option<Arc<L>>,
    events: Option<Sender<ProbeEvent>>,
) -> Manifest {
    let works::Manifest {
        source,
        works,
        config,
        ..
    } = resolved;
    let works = match loader {
        Some(loader) => probe_all(works, loader, &config.thumbnails, events).await,
        None => defer_all(works, &config.thumbnails),
    };
    Manifest {
        source,
        works,
        config,
    }
}
