//! Browser tests for the gallery page: reveal-on-scroll and the in-browser
//! thumbnail cascade of a deferred build.
//!
//! Run with: `cargo test --test browser_reveal -- --ignored`

use headless_chrome::{Browser, LaunchOptions, Tab};
use std::fs;
use std::process::Command;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Build a deferred gallery once: one work with a local thumbnail, one whose
/// thumbnail is missing, and enough filler to push cards below the fold.
fn generated_site() -> &'static TempDir {
    static SITE: OnceLock<TempDir> = OnceLock::new();
    SITE.get_or_init(|| {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let site = tmp.path().join("site");
        fs::create_dir_all(site.join("assets")).unwrap();
        fs::write(
            site.join("assets/shot.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="6" height="4"/>"#,
        )
        .unwrap();

        let mut works = vec![
            r#"{"title": "Shot", "url": "", "thumb": "assets/shot.svg"}"#.to_string(),
            r#"{"title": "Broken", "url": "", "thumb": "assets/missing.png"}"#.to_string(),
        ];
        works.extend((0..30).map(|i| format!(r#"{{"title": "Filler {i}", "url": ""}}"#)));
        fs::write(site.join("works.json"), format!("[{}]", works.join(","))).unwrap();

        let status = Command::new(env!("CARGO_BIN_EXE_works-gal"))
            .current_dir(tmp.path())
            .args(["build", "--defer"])
            .args(["--source", "site", "--output", "dist", "--temp-dir", ".temp"])
            .status()
            .expect("failed to run works-gal");
        assert!(status.success(), "fixture generation failed");
        tmp
    })
}

fn browser() -> &'static Browser {
    static B: OnceLock<Browser> = OnceLock::new();
    B.get_or_init(|| {
        Browser::new(LaunchOptions {
            window_size: Some((1280, 800)),
            ..Default::default()
        })
        .expect("failed to launch Chrome")
    })
}

fn load_index() -> Arc<Tab> {
    let file = generated_site().path().join("dist/index.html");
    assert!(file.exists(), "missing: {}", file.display());

    let tab = browser().new_tab().unwrap();
    tab.navigate_to(&format!("file://{}", file.display()))
        .unwrap()
        .wait_until_navigated()
        .unwrap();
    tab
}

fn eval_bool(tab: &Tab, js: &str, await_promise: bool) -> bool {
    tab.evaluate(js, await_promise)
        .expect("failed to evaluate JS")
        .value
        .and_then(|v| v.as_bool())
        .expect("expected a boolean")
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn first_card_is_revealed_on_load() {
    let tab = load_index();
    let visible = eval_bool(
        &tab,
        r#"new Promise((resolve) => setTimeout(() => resolve(
            document.querySelector('.work-card.reveal').classList.contains('is-visible')
        ), 300))"#,
        true,
    );
    assert!(visible);
}

#[test]
#[ignore]
fn cards_below_the_fold_wait_for_scroll() {
    let tab = load_index();
    let hidden = eval_bool(
        &tab,
        r#"(function() {
            const cards = document.querySelectorAll('.work-card.reveal');
            return !cards[cards.length - 1].classList.contains('is-visible');
        })()"#,
        false,
    );
    assert!(hidden);

    let revealed = eval_bool(
        &tab,
        r#"new Promise((resolve) => {
            const cards = document.querySelectorAll('.work-card.reveal');
            const last = cards[cards.length - 1];
            last.scrollIntoView();
            setTimeout(() => resolve(last.classList.contains('is-visible')), 300);
        })"#,
        true,
    );
    assert!(revealed);
}

#[test]
#[ignore]
fn footer_shows_current_year() {
    let tab = load_index();
    let stamped = eval_bool(
        &tab,
        r#"document.getElementById('year').textContent === String(new Date().getFullYear())"#,
        false,
    );
    assert!(stamped);
}

// ---------------------------------------------------------------------------
// Deferred thumbnail cascade
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn broken_thumbnail_falls_through_to_placeholder() {
    let tab = load_index();
    let landed = eval_bool(
        &tab,
        r#"new Promise((resolve) => {
            const img = document.querySelectorAll('.work-card img')[1];
            img.loading = 'eager';
            const check = () => img.src.endsWith('assets/placeholder.svg') && img.complete;
            let tries = 0;
            const poll = () => {
                if (check()) return resolve(true);
                if (++tries > 50) return resolve(false);
                setTimeout(poll, 100);
            };
            poll();
        })"#,
        true,
    );
    assert!(landed);
}

#[test]
#[ignore]
fn loaded_thumbnail_stays_bound() {
    let tab = load_index();
    let kept = eval_bool(
        &tab,
        r#"new Promise((resolve) => setTimeout(() => {
            const img = document.querySelectorAll('.work-card img')[0];
            resolve(img.src.endsWith('assets/shot.svg') && img.naturalWidth > 0);
        }, 500))"#,
        true,
    );
    assert!(kept);
}
