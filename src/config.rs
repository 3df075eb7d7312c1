//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user `config.toml` placed in the source root.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Overrides stock defaults
//! ├── index.html               # Page carrying the embedded works blob (optional)
//! ├── works.json               # Work list (optional)
//! └── assets/                  # Copied to the output root
//!     └── placeholder.svg      # Thumbnail of last resort (stock one if absent)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Works"
//! assets_dir = "assets"
//!
//! [data]
//! path = "works.json"          # Network data resource, relative to the page
//! page = "index.html"          # Page holding the embedded data blob
//! embedded_id = "works-data"   # id of the <script> element carrying the blob
//!
//! [thumbnails]
//! directories = ["", "images/", "assets/"]
//! filenames = ["og.png", "og.jpg", ...]
//! placeholder = "assets/placeholder.svg"
//! width = 600
//! height = 400
//!
//! [network]
//! # timeout_secs = 10          # Omit for no timeout
//!
//! [theme]
//! card_min_width = "16rem"
//! grid_gap = "2rem"
//! grid_padding = "2rem"
//!
//! [colors.light]
//! background = "#faf8f4"
//! accent = "#b5502b"
//! ...
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Page title and heading.
    pub title: String,
    /// Directory (relative to the source root) copied verbatim to the output root.
    pub assets_dir: String,
    /// Where the work list comes from.
    pub data: DataConfig,
    /// Thumbnail guessing and display settings.
    pub thumbnails: ThumbnailsConfig,
    /// HTTP client settings for data fetch and thumbnail probing.
    pub network: NetworkConfig,
    /// Layout settings.
    pub theme: ThemeConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Works".to_string(),
            assets_dir: "assets".to_string(),
            data: DataConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
            network: NetworkConfig::default(),
            theme: ThemeConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "data.path must not be empty".into(),
            ));
        }
        if self.data.embedded_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "data.embedded_id must not be empty".into(),
            ));
        }
        if self.thumbnails.placeholder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.placeholder must not be empty".into(),
            ));
        }
        if escapes_root(&self.thumbnails.placeholder) {
            return Err(ConfigError::Validation(
                "thumbnails.placeholder must not contain '..'".into(),
            ));
        }
        if escapes_root(&self.assets_dir) {
            return Err(ConfigError::Validation(
                "assets_dir must not contain '..'".into(),
            ));
        }
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width and thumbnails.height must be non-zero".into(),
            ));
        }
        if self.network.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "network.timeout_secs must be positive (omit it to disable)".into(),
            ));
        }
        Ok(())
    }
}

/// Whether a relative location climbs out of the directory it is joined onto.
fn escapes_root(location: &str) -> bool {
    location.split(['/', '\\']).any(|segment| segment == "..")
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Path of the network data resource, resolved against the document location.
    pub path: String,
    /// Page (relative to the source root) holding the embedded data blob.
    pub page: String,
    /// `id` of the `<script>` element carrying the embedded blob.
    pub embedded_id: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "works.json".to_string(),
            page: "index.html".to_string(),
            embedded_id: "works-data".to_string(),
        }
    }
}

/// Thumbnail guessing and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Directories tried under each work URL, in order. `""` is the URL's own directory.
    pub directories: Vec<String>,
    /// Conventional image filenames tried in each directory, in order.
    pub filenames: Vec<String>,
    /// Location bound when every other candidate fails. Always tried last.
    pub placeholder: String,
    /// Rendered `<img>` width, for layout stability.
    pub width: u32,
    /// Rendered `<img>` height, for layout stability.
    pub height: u32,
}

/// Open Graph / social / thumbnail naming conventions seen in the wild,
/// including the Next.js App Router `api/og` endpoint.
pub const DEFAULT_THUMBNAIL_FILENAMES: [&str; 15] = [
    "og.png",
    "og.jpg",
    "og-image.png",
    "og-image.jpg",
    "thumbnail.png",
    "thumbnail.jpg",
    "thumb.png",
    "thumb.jpg",
    "social.png",
    "social.jpg",
    "cover.png",
    "cover.jpg",
    "api/og",
    "api/og.png",
    "api/og.jpg",
];

pub const DEFAULT_THUMBNAIL_DIRECTORIES: [&str; 3] = ["", "images/", "assets/"];

pub const DEFAULT_PLACEHOLDER: &str = "assets/placeholder.svg";

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            directories: DEFAULT_THUMBNAIL_DIRECTORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            filenames: DEFAULT_THUMBNAIL_FILENAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            width: 600,
            height: 400,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds. When absent, requests never time out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Minimum card width before the grid wraps (CSS value).
    pub card_min_width: String,
    /// Gap between cards (CSS value).
    pub grid_gap: String,
    /// Padding around the grid container (CSS value).
    pub grid_padding: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            card_min_width: "16rem".to_string(),
            grid_gap: "2rem".to_string(),
            grid_padding: "2rem".to_string(),
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// One palette, emitted as `--color-*` custom properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Thumbnail frame fill, visible while an image loads.
    pub surface: String,
    /// Titles and body text.
    pub text: String,
    /// Descriptions and footer.
    pub text_muted: String,
    /// Thumbnail frame outline.
    pub border: String,
    /// Hovered titles and the external-link icon.
    pub accent: String,
}

impl ColorScheme {
    /// Warm paper tones with a terracotta accent.
    pub fn default_light() -> Self {
        Self {
            background: "#faf8f4".to_string(),
            surface: "#f0ebe3".to_string(),
            text: "#1f1c18".to_string(),
            text_muted: "#6e675e".to_string(),
            border: "#e2dbd0".to_string(),
            accent: "#b5502b".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#161412".to_string(),
            surface: "#221f1b".to_string(),
            text: "#ede8df".to_string(),
            text_muted: "#9c958a".to_string(),
            border: "#34302a".to_string(),
            accent: "#e58a5e".to_string(),
        }
    }

    /// `--color-*` declarations, one per line, each prefixed by `indent`.
    fn css_properties(&self, indent: &str) -> String {
        [
            ("bg", &self.background),
            ("surface", &self.surface),
            ("text", &self.text),
            ("text-muted", &self.text_muted),
            ("border", &self.border),
            ("accent", &self.accent),
        ]
        .iter()
        .map(|(name, value)| format!("{indent}--color-{name}: {value};\n"))
        .collect()
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# works-gal Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the source directory next to index.html / works.json.
# Unknown keys will cause an error.

# Page title and heading
title = "Works"

# Directory copied verbatim to the output root
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Work list sources
# ---------------------------------------------------------------------------
[data]
# JSON array of works, resolved against the document location.
# Fetched with cache bypass when the location is served over http(s).
path = "works.json"

# Page carrying an embedded copy of the works as
#   <script id="works-data" type="application/json">[ ... ]</script>
# Used first when the location is a local file, and as a fallback otherwise.
page = "index.html"
embedded_id = "works-data"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Candidate thumbnails are guessed by joining each directory + filename onto
# the work's url, directory by directory. An explicit `thumb` on a work is
# always tried first, and the placeholder always last.
directories = ["", "images/", "assets/"]
filenames = [
    "og.png", "og.jpg", "og-image.png", "og-image.jpg",
    "thumbnail.png", "thumbnail.jpg", "thumb.png", "thumb.jpg",
    "social.png", "social.jpg", "cover.png", "cover.jpg",
    "api/og", "api/og.png", "api/og.jpg",
]
placeholder = "assets/placeholder.svg"

# Rendered image box (3:2 by default), reserved before the image loads.
width = 600
height = 400

# ---------------------------------------------------------------------------
# Network
# ---------------------------------------------------------------------------
[network]
# Per-request timeout for the data fetch and each thumbnail probe.
# Omit to never time out.
# timeout_secs = 10

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[theme]
card_min_width = "16rem"
grid_gap = "2rem"
grid_padding = "2rem"

# ---------------------------------------------------------------------------
# Colors (light scheme, and dark for prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.light]
background = "#faf8f4"
surface = "#f0ebe3"       # Thumbnail frame while loading
text = "#1f1c18"
text_muted = "#6e675e"    # Descriptions, footer
border = "#e2dbd0"
accent = "#b5502b"        # Hovered titles, external-link icon

[colors.dark]
background = "#161412"
surface = "#221f1b"
text = "#ede8df"
text_muted = "#9c958a"
border = "#34302a"
accent = "#e58a5e"
"##
}

/// Generate CSS custom properties from color config.
///
/// The light scheme is the default; the dark one applies under
/// `prefers-color-scheme: dark`.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
        colors.light.css_properties("    "),
        colors.dark.css_properties("        "),
    )
}

/// Generate CSS custom properties from theme and thumbnail config.
pub fn generate_theme_css(theme: &ThemeConfig, thumbnails: &ThumbnailsConfig) -> String {
    format!(
        r#":root {{
    --card-min-width: {card_min_width};
    --grid-gap: {grid_gap};
    --grid-padding: {grid_padding};
    --thumb-aspect: {width} / {height};
}}"#,
        card_min_width = theme.card_min_width,
        grid_gap = theme.grid_gap,
        grid_padding = theme.grid_padding,
        width = thumbnails.width,
        height = thumbnails.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_data_sources() {
        let config = SiteConfig::default();
        assert_eq!(config.data.path, "works.json");
        assert_eq!(config.data.page, "index.html");
        assert_eq!(config.data.embedded_id, "works-data");
    }

    #[test]
    fn default_thumbnail_conventions() {
        let config = ThumbnailsConfig::default();
        assert_eq!(config.directories, vec!["", "images/", "assets/"]);
        assert_eq!(config.filenames.len(), 15);
        assert_eq!(config.filenames[0], "og.png");
        assert!(config.filenames.iter().any(|f| f == "api/og"));
        assert_eq!(config.placeholder, "assets/placeholder.svg");
        assert_eq!((config.width, config.height), (600, 400));
    }

    #[test]
    fn default_network_has_no_timeout() {
        assert_eq!(SiteConfig::default().network.timeout_secs, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[colors.light]
background = "#fafafa"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.colors.light.background, "#fafafa");
        assert_eq!(config.colors.light.text, "#1f1c18");
        assert_eq!(config.thumbnails.filenames.len(), 15);
    }

    #[test]
    fn parse_thumbnail_overrides() {
        let toml = r#"
[thumbnails]
directories = ["static/"]
filenames = ["preview.webp"]
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.thumbnails.directories, vec!["static/"]);
        assert_eq!(config.thumbnails.filenames, vec!["preview.webp"]);
        assert_eq!(config.thumbnails.placeholder, DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.background = "#1a1a1a".to_string();

        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-bg: #1a1a1a"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
        assert!(css.contains("--color-accent: #b5502b;"));
        assert!(css.contains("--color-surface: #221f1b;"));
    }

    #[test]
    fn generate_theme_css_includes_layout_variables() {
        let css = generate_theme_css(&ThemeConfig::default(), &ThumbnailsConfig::default());
        assert!(css.contains("--card-min-width: 16rem"));
        assert!(css.contains("--grid-gap: 2rem"));
        assert!(css.contains("--thumb-aspect: 600 / 400"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Works");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
title = "Side projects"

[data]
path = "data/works.json"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.title, "Side projects");
        assert_eq!(config.data.path, "data/works.json");
        assert_eq!(config.data.embedded_id, "works-data");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[network]
timeout_secs = 0
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[thumbnails]
width = 600
height = 400
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[thumbnails]
width = 800
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let thumbs = merged.get("thumbnails").unwrap();
        assert_eq!(thumbs.get("width").unwrap().as_integer(), Some(800));
        assert_eq!(thumbs.get("height").unwrap().as_integer(), Some(400));
    }

    #[test]
    fn merge_toml_replaces_arrays_wholesale() {
        let base: toml::Value = toml::from_str(r#"filenames = ["a", "b", "c"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"filenames = ["z"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("filenames").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[thumbnails]
placeholdr = "x.svg"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[datas]\npath = \"x\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_empty_placeholder() {
        let mut config = SiteConfig::default();
        config.thumbnails.placeholder = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn validate_rejects_parent_dir_paths() {
        for bad in ["../x.svg", "assets/../../x.svg", "assets\\..\\x.svg"] {
            let mut config = SiteConfig::default();
            config.thumbnails.placeholder = bad.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("placeholder"), "{bad}");
        }

        let mut config = SiteConfig::default();
        config.assets_dir = "..".to_string();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.thumbnails.placeholder = "assets/..hidden.svg".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_zero_dimensions() {
        let mut config = SiteConfig::default();
        config.thumbnails.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_data_path() {
        let mut config = SiteConfig::default();
        config.data.path = String::new();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.title, defaults.title);
        assert_eq!(config.data.path, defaults.data.path);
        assert_eq!(config.thumbnails.directories, defaults.thumbnails.directories);
        assert_eq!(config.thumbnails.filenames, defaults.thumbnails.filenames);
        assert_eq!(config.thumbnails.placeholder, defaults.thumbnails.placeholder);
        assert_eq!(config.network.timeout_secs, None);
        assert_eq!(config.colors.light, ColorScheme::default_light());
        assert_eq!(config.colors.dark, ColorScheme::default_dark());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for section in ["data", "thumbnails", "network", "theme", "colors"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }
}
