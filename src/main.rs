use clap::{Parser, Subcommand};
use headless_blog::article::ArticleState;
use headless_blog::config::{self, SiteConfig};
use headless_blog::source::{ApiClient, ContentSource, FixtureSource, SourceError};
use headless_blog::{fetch, generate, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headless-blog")]
#[command(about = "Static blog generator over a headless CMS")]
#[command(long_about = "\
Static blog generator over a headless CMS

Articles live in the CMS. The build fetches them through the content API,
normalizes them and writes a plain static site:

  dist/
  ├── index.html                   # First listing page + \"load more\" button
  ├── posts/2.json                 # Later listing pages, pre-rendered
  ├── post/<id>/index.html         # One page per article, with reading time
  └── 404.html

Credentials are read from config.toml or, preferably, from the environment
(a .env file is honoured):

  PRISMIC_API_ENDPOINT   API root, e.g. https://my-repo.cdn.prismic.io/api/v2
  PRISMIC_ACCESS_TOKEN   Access token for private repositories

Log verbosity follows RUST_LOG (default: headless_blog=info).

Run 'headless-blog gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".headless-blog-temp", global = true)]
    temp_dir: PathBuf,

    /// Read documents from a JSON file instead of the content API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the listing and every article into a manifest
    Fetch,
    /// Produce the HTML site from the manifest
    Generate,
    /// Run the full pipeline: fetch → generate
    Build,
    /// Fetch and report content without writing the site
    Check,
    /// Resolve a single article and show the outcome
    Article {
        /// Article identifier (uid or slug)
        id: String,
        /// Print the rendered HTML page instead of a summary
        #[arg(long)]
        html: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let manifest_path = cli.temp_dir.join("manifest.json");

    match &cli.command {
        Command::Fetch => {
            let config = load_config(&cli.config)?;
            let source = open_source(cli.fixture.as_deref(), &config)?;
            let manifest = fetch::fetch(source, &config).await?;
            fetch::write_manifest(&manifest, &manifest_path)?;
            output::print_fetch_output(&manifest);
        }
        Command::Generate => {
            let manifest = fetch::read_manifest(&manifest_path)?;
            generate::generate_site(&manifest, &cli.output)?;
            output::print_generate_output(&manifest);
        }
        Command::Build => {
            let config = load_config(&cli.config)?;
            let source = open_source(cli.fixture.as_deref(), &config)?;

            println!("==> Stage 1: Fetching from {}", source.name());
            let manifest = fetch::fetch(source, &config).await?;
            fetch::write_manifest(&manifest, &manifest_path)?;
            output::print_fetch_output(&manifest);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            generate::generate_site(&manifest, &cli.output)?;
            output::print_generate_output(&manifest);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let config = load_config(&cli.config)?;
            let source = open_source(cli.fixture.as_deref(), &config)?;
            println!("==> Checking {}", source.name());
            let manifest = fetch::fetch(source, &config).await?;
            output::print_fetch_output(&manifest);
            if manifest.skipped.is_empty() {
                println!("==> Content is valid");
            } else {
                println!("==> {} malformed documents skipped", manifest.skipped.len());
            }
        }
        Command::Article { id, html } => {
            let config = load_config(&cli.config)?;
            let source = open_source(cli.fixture.as_deref(), &config)?;
            let state =
                ArticleState::load(source.as_ref(), &config.source.document_type, id).await?;
            if *html {
                println!("{}", generate::render_article_state(&state, &config).into_string());
            } else {
                output::print_article_state(&state);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for command output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("headless_blog=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load `config.toml` and apply credential overrides from the environment.
fn load_config(dir: &Path) -> Result<SiteConfig, config::ConfigError> {
    let mut config = config::load_config(dir)?;
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn open_source(
    fixture: Option<&Path>,
    config: &SiteConfig,
) -> Result<Arc<dyn ContentSource>, SourceError> {
    let source: Arc<dyn ContentSource> = match fixture {
        Some(path) => Arc::new(FixtureSource::load(path)?),
        None => Arc::new(ApiClient::from_config(&config.source)?),
    };
    Ok(source)
}
