//! # works-gal
//!
//! A static site generator for a gallery of portfolio works. Each work is a
//! title, a link and an optional description; the gallery page shows a card
//! per work with a thumbnail guessed from the work's own site.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Like any build that talks to the network, each stage writes a JSON
//! manifest the next stage consumes:
//!
//! ```text
//! 1. Resolve   source/ + location  →  manifest.json           (where the list comes from)
//! 2. Probe     works manifest      →  probed/manifest.json    (a thumbnail per work)
//! 3. Generate  probed manifest     →  dist/                   (final HTML page)
//! ```
//!
//! - **Debuggability**: each manifest is human-readable JSON you can inspect.
//! - **Partial re-runs**: re-render without re-probing dozens of remote URLs.
//! - **Testability**: the resolvers take their I/O through traits
//!   ([`works::WorksFetcher`], [`thumbnail::ImageLoader`]) so unit tests run
//!   against scripted fakes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`works`] | Stage 1: data-source fallback chain: embedded blob, `works.json`, built-in sample |
//! | [`thumbnail`] | Stage 2: candidate cascade and the sequential probe state machine |
//! | [`generate`] | Stage 3: renders the gallery page with Maud |
//! | [`fetch`] | `reqwest`/filesystem backend for both resolvers |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | `WorkRecord`, shared between all stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Fail on Data
//!
//! A broken data feed must not break the page. Work list resolution absorbs
//! every source failure and ends, at worst, on a built-in sample record.
//! Thumbnail probing ends, at worst, on the placeholder. Only structural
//! problems (bad config, unwritable output) stop a build.
//!
//! ## Guess, Then Commit to the First Hit
//!
//! Sites publish social images under many names (`og.png`, `og-image.jpg`,
//! `assets/cover.png`, Next.js `api/og`, ...). Instead of asking for explicit
//! metadata, the thumbnail resolver tries the common conventions in a fixed
//! order and keeps the first location that loads. The order is deterministic,
//! so the same input always binds the same thumbnail.
//!
//! ## Offline Builds
//!
//! `probe --defer` skips build-time probing entirely. The page then carries
//! each work's candidate list and the browser walks it on image load errors,
//! with the same order and the same placeholder at the end.

pub mod config;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod thumbnail;
pub mod types;
pub mod works;

#[cfg(test)]
pub(crate) mod test_helpers;
