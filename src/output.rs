//! CLI output formatting for all pipeline stages.
//!
//! Output is **information-centric**: each work leads with its positional
//! index and title, with links and thumbnail details as indented context
//! lines.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! ```text
//! Works (network: https://me.example/works.json)
//! 001 Type Lab
//!     Link: https://ex.com/type
//!     Thumb: type.png
//! 002 (untitled)
//!     Link: (none)
//! ```
//!
//! ## Probe
//!
//! ```text
//! 001 Type Lab
//!     Thumbnail: https://ex.com/images/og.png (resolved, 16/46 tried)
//! ```
//!
//! ## Generate
//!
//! ```text
//! Gallery → dist/index.html (2 works)
//! Data → dist/works.json
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::thumbnail::{ProbeEvent, ThumbnailOutcome};
use crate::types::WorkRecord;
use crate::works::WorkSource;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format a work header line; blank titles are shown as `(untitled)`.
fn work_line(index: usize, title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        format!("{} (untitled)", format_index(index))
    } else {
        format!("{} {}", format_index(index), title)
    }
}

fn outcome_label(outcome: ThumbnailOutcome) -> &'static str {
    match outcome {
        ThumbnailOutcome::Resolved => "resolved",
        ThumbnailOutcome::Exhausted => "placeholder",
        ThumbnailOutcome::Deferred => "deferred",
    }
}

// ============================================================================
// Stage 1: Resolve output
// ============================================================================

/// Format the resolved work list.
pub fn format_resolve_output(works: &[WorkRecord], source: WorkSource, origin: &str) -> Vec<String> {
    let mut lines = Vec::new();
    match source {
        WorkSource::Sample => lines.push(format!("Works ({})", source)),
        _ => lines.push(format!("Works ({}: {})", source, origin)),
    }
    for (i, work) in works.iter().enumerate() {
        lines.push(work_line(i + 1, &work.title));
        let link = work.url.trim();
        lines.push(format!(
            "    Link: {}",
            if link.is_empty() { "(none)" } else { link }
        ));
        if let Some(thumb) = work.thumb.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            lines.push(format!("    Thumb: {}", thumb));
        }
    }
    lines
}

/// Print resolve output to stdout.
pub fn print_resolve_output(works: &[WorkRecord], source: WorkSource, origin: &str) {
    for line in format_resolve_output(works, source, origin) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Probe output
// ============================================================================

/// Format a single probe progress event as display lines.
pub fn format_probe_event(event: &ProbeEvent) -> Vec<String> {
    match event {
        ProbeEvent::Finished {
            index,
            title,
            bound,
            outcome,
            attempts,
            candidate_count,
        } => vec![
            work_line(*index, title),
            format!(
                "    Thumbnail: {} ({}, {}/{} tried)",
                bound,
                outcome_label(*outcome),
                attempts,
                candidate_count
            ),
        ],
    }
}

/// Format the candidate list for one work (the `candidates` command).
pub fn format_candidates(candidates: &[String]) -> Vec<String> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} {}", format_index(i + 1), c))
        .collect()
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

/// Format generate stage output.
pub fn format_generate_output(work_count: usize, output_dir: &Path) -> Vec<String> {
    let noun = if work_count == 1 { "work" } else { "works" };
    vec![
        format!(
            "Gallery \u{2192} {} ({} {})",
            output_dir.join("index.html").display(),
            work_count,
            noun
        ),
        format!("Data \u{2192} {}", output_dir.join("works.json").display()),
    ]
}

/// Print generate output to stdout.
pub fn print_generate_output(work_count: usize, output_dir: &Path) {
    for line in format_generate_output(work_count, output_dir) {
        println!("{}", line);
    }
}
