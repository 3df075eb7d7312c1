//! HTML gallery generation.
//!
//! Stage 3 of the build pipeline. Takes the probed manifest and writes the
//! final static site.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html              # Gallery page (works embedded as a JSON blob)
//! ├── works.json              # Same work list, for served deployments
//! └── assets/
//!     └── placeholder.svg     # Copied from the source, or the stock one
//! ```
//!
//! The page embeds the resolved work list in
//! `<script id="works-data" type="application/json">`, so a generated page
//! opened from disk is itself a complete data source for the next build.
//!
//! ## Card Markup
//!
//! ```html
//! <article class="work-card reveal" role="listitem">
//!   <div class="thumb-frame"><img src="…" width="600" height="400" …></div>
//!   <h3 class="work-title"><a href="…" target="_blank" rel="noopener noreferrer">Title <svg class="icon-external">…</svg></a></h3>
//!   <p class="work-desc">…</p>
//! </article>
//! ```
//!
//! Deferred thumbnails carry their remaining candidates in `data-candidates`;
//! `static/reveal.js` walks them on load errors. It also handles the
//! reveal-on-scroll animation and stamps the current year into the footer.

use crate::config::{self, SiteConfig};
use crate::thumbnail::{Manifest, ProbedWork};
use crate::types::WorkRecord;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to copy assets: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/reveal.js");
const PLACEHOLDER_SVG: &str = include_str!("../static/placeholder.svg");

/// Write the site for `manifest` into `output_dir`.
///
/// `source_root` is where the assets directory is copied from.
pub fn generate(
    manifest: &Manifest,
    source_root: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let config = &manifest.config;
    fs::create_dir_all(output_dir)?;

    let assets_src = source_root.join(&config.assets_dir);
    if assets_src.is_dir() {
        copy_dir_recursive(&assets_src, &output_dir.join(&config.assets_dir))?;
    }
    ensure_placeholder(output_dir, &config.thumbnails.placeholder)?;

    let records: Vec<&WorkRecord> = manifest.works.iter().map(|w| &w.work).collect();
    fs::write(
        output_dir.join("works.json"),
        serde_json::to_string_pretty(&records)?,
    )?;

    let css = format!(
        "{}\n\n{}\n\n{}",
        config::generate_color_css(&config.colors),
        config::generate_theme_css(&config.theme, &config.thumbnails),
        CSS_STATIC
    );
    let page = render_index(&manifest.works, config, &css)?;
    fs::write(output_dir.join("index.html"), page.into_string())?;

    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), GenerateError> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Write the stock placeholder unless the assets already provide one.
///
/// Only relative placeholder locations are materialized; an absolute URL is
/// the user's responsibility.
fn ensure_placeholder(output_dir: &Path, placeholder: &str) -> std::io::Result<()> {
    if placeholder.contains("://") || placeholder.starts_with('/') {
        return Ok(());
    }
    let path = output_dir.join(placeholder);
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, PLACEHOLDER_SVG)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Inline external-link indicator appended to every title link.
fn external_icon() -> Markup {
    html! {
        svg.icon-external viewBox="0 0 24 24" aria-hidden="true" {
            path fill="currentColor"
                d="M14 3h7v7h-2V7.41l-9.29 9.3-1.42-1.42 9.3-9.3H14V3z M5 5h7v2H7v10h10v-5h2v7H5V5z" {}
        }
    }
}

/// Serialize works for embedding inside a `<script>` element.
///
/// `</` is escaped so a title containing `</script>` cannot end the element.
fn embedded_json(works: &[ProbedWork]) -> Result<String, serde_json::Error> {
    let records: Vec<&WorkRecord> = works.iter().map(|w| &w.work).collect();
    Ok(serde_json::to_string(&records)?.replace("</", "<\\/"))
}

/// Renders one work card.
pub fn render_card(probed: &ProbedWork, config: &SiteConfig) -> Markup {
    let work = &probed.work;
    let thumb = &probed.thumbnail;
    let remaining = thumb.remaining();
    let candidates_attr = (!remaining.is_empty())
        .then(|| serde_json::to_string(remaining).unwrap_or_default());
    let alt = format!("Thumbnail of {}", work.title);

    html! {
        article.work-card.reveal role="listitem" {
            div.thumb-frame {
                img src=(thumb.bound)
                    alt=(alt)
                    width=(config.thumbnails.width)
                    height=(config.thumbnails.height)
                    loading="lazy"
                    decoding="async"
                    data-candidates=[candidates_attr];
            }
            h3.work-title {
                a href=(work.url) target="_blank" rel="noopener noreferrer" {
                    (work.title)
                    (external_icon())
                }
            }
            p.work-desc { (work.desc.as_deref().unwrap_or_default()) }
        }
    }
}

/// Renders the gallery page.
fn render_index(
    works: &[ProbedWork],
    config: &SiteConfig,
    css: &str,
) -> Result<Markup, serde_json::Error> {
    let blob = embedded_json(works)?;

    let content = html! {
        header.site-header {
            h1 { (config.title) }
        }
        main {
            section.works-grid id="works-grid" role="list" {
                @if works.is_empty() {
                    p.work-desc { "No works yet. Add some to " (config.data.path) "." }
                }
                @for probed in works {
                    (render_card(probed, config))
                }
            }
        }
        footer.site-footer {
            "© " span id="year" {} " " (config.title)
        }
        script id=(config.data.embedded_id) type="application/json" { (PreEscaped(blob)) }
        script { (PreEscaped(JS)) }
    };

    Ok(base_document(&config.title, css, content))
}

// ============================================================================
// Tests
// ============================================================================
