use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use works_gal::config::{self, SiteConfig};
use works_gal::fetch::DocumentFetcher;
use works_gal::thumbnail::{self, CandidateList};
use works_gal::types::WorkRecord;
use works_gal::{generate, output, works};

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Generate(#[from] generate::GenerateError),
    #[error(transparent)]
    DataUrl(#[from] works::DataUrlError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid location {0:?}: must be an http, https or file URL")]
    Location(String),
}

/// Shared flags for commands that bind thumbnails.
#[derive(clap::Args, Clone)]
struct ProbeArgs {
    /// Don't probe at build time; let the browser walk the candidates instead
    #[arg(long)]
    defer: bool,
}

#[derive(Parser)]
#[command(name = "works-gal")]
#[command(about = "Static gallery generator for portfolio works")]
#[command(long_about = "\
Static gallery generator for portfolio works

Source structure:

  site/
  ├── config.toml       # Optional, see 'works-gal gen-config'
  ├── works.json        # [{\"title\", \"url\", \"desc\"?, \"thumb\"?}, ...]
  ├── index.html        # Optional page with an embedded copy of the works:
  │                     #   <script id=\"works-data\" type=\"application/json\">
  └── assets/           # Copied to the output root

Work list (first available wins):
  file: location   embedded blob → works.json → embedded blob → sample
  http location    works.json → embedded blob → sample

Thumbnail (first that loads wins):
  thumb → <url>/{,images/,assets/}{og,og-image,thumbnail,thumb,social,cover}.{png,jpg}
                                   and api/og{,.png,.jpg} → placeholder")]
#[command(version = env!("WORKS_GAL_VERSION"))]
struct Cli {
    /// Source directory
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate manifests
    #[arg(long, default_value = ".works-gal-temp", global = true)]
    temp_dir: PathBuf,

    /// Document location the gallery is resolved for [default: file://<source>/index.html]
    #[arg(long, global = true)]
    location: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the work list into a manifest
    Resolve,
    /// Bind a thumbnail to every resolved work
    Probe(ProbeArgs),
    /// Produce the gallery page from the probed manifest
    Generate,
    /// Run the full pipeline: resolve → probe → generate
    Build(ProbeArgs),
    /// Print the thumbnail candidates for one work URL
    Candidates {
        /// The work's URL
        url: String,
        /// Explicit thumbnail override
        #[arg(long)]
        thumb: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Resolve => {
            let config = config::load_config(&cli.source)?;
            let manifest = resolve_stage(&cli, config).await?;
            write_json(&cli.temp_dir.join("manifest.json"), &manifest)?;
        }
        Command::Probe(args) => {
            let resolved: works::Manifest = read_json(&cli.temp_dir.join("manifest.json"))?;
            let probed = probe_stage(resolved, args).await?;
            write_json(&probed_manifest_path(&cli.temp_dir), &probed)?;
        }
        Command::Generate => {
            let probed: thumbnail::Manifest = read_json(&probed_manifest_path(&cli.temp_dir))?;
            generate::generate(&probed, &cli.source, &cli.output)?;
            output::print_generate_output(probed.works.len(), &cli.output);
        }
        Command::Build(args) => {
            let config = config::load_config(&cli.source)?;

            println!("==> Stage 1: Resolving works");
            let resolved = resolve_stage(&cli, config).await?;
            write_json(&cli.temp_dir.join("manifest.json"), &resolved)?;

            println!("==> Stage 2: Binding thumbnails");
            let probed = probe_stage(resolved, args).await?;
            write_json(&probed_manifest_path(&cli.temp_dir), &probed)?;

            println!("==> Stage 3: Generating HTML \u{2192} {}", cli.output.display());
            generate::generate(&probed, &cli.source, &cli.output)?;
            output::print_generate_output(probed.works.len(), &cli.output);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Candidates { url, thumb } => {
            let config = config::load_config(&cli.source)?;
            let work = WorkRecord {
                title: String::new(),
                url: url.clone(),
                desc: None,
                thumb: thumb.clone(),
            };
            let candidates = CandidateList::for_work(&work, &config.thumbnails);
            for line in output::format_candidates(candidates.as_slice()) {
                println!("{}", line);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

async fn resolve_stage(cli: &Cli, config: SiteConfig) -> Result<works::Manifest, CliError> {
    let location = document_location(cli.location.as_deref(), &cli.source, &config.data.page)?;
    info!(%location, "resolving works");
    let fetcher = DocumentFetcher::new(location.clone(), timeout(&config))?;
    let manifest = works::resolve(&cli.source, &location, config, fetcher).await?;
    output::print_resolve_output(&manifest.works, manifest.source, &manifest.data_url);
    Ok(manifest)
}

async fn probe_stage(
    resolved: works::Manifest,
    args: &ProbeArgs,
) -> Result<thumbnail::Manifest, CliError> {
    if args.defer {
        let count = resolved.works.len();
        let probed = thumbnail::process::<DocumentFetcher>(resolved, None, None).await;
        println!("Thumbnails deferred to the browser ({} works)", count);
        return Ok(probed);
    }

    let location = Url::parse(&resolved.location)
        .map_err(|_| CliError::Location(resolved.location.clone()))?;
    let loader = Arc::new(DocumentFetcher::new(location, timeout(&resolved.config))?);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_probe_event(&event) {
                println!("{}", line);
            }
        }
    });
    let probed = thumbnail::process(resolved, Some(loader), Some(tx)).await;
    printer.join().ok();
    Ok(probed)
}

fn probed_manifest_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join("probed").join("manifest.json")
}

fn timeout(config: &SiteConfig) -> Option<Duration> {
    config.network.timeout_secs.map(Duration::from_secs)
}

/// The document location: `--location` if given, else the source page as a `file:` URL.
fn document_location(
    explicit: Option<&str>,
    source: &Path,
    page: &str,
) -> Result<Url, CliError> {
    match explicit {
        Some(raw) => {
            let url = Url::parse(raw).map_err(|_| CliError::Location(raw.to_string()))?;
            match url.scheme() {
                "http" | "https" | "file" => Ok(url),
                _ => Err(CliError::Location(raw.to_string())),
            }
        }
        None => {
            let page_path = std::path::absolute(source)?.join(page);
            Url::from_file_path(&page_path)
                .map_err(|_| CliError::Location(page_path.display().to_string()))
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Initialize the tracing subsystem. Logs go to stderr; stage reports to stdout.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "works_gal=debug"
    } else {
        "works_gal=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
