use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use airbnb_page_scraper::adapters::browser::chromium::ChromiumLauncher;
use airbnb_page_scraper::adapters::browser::client::PageScraper;
use airbnb_page_scraper::config::load_config;
use airbnb_page_scraper::config::types::Config;
use airbnb_page_scraper::http::server::{self, AppState};
use airbnb_page_scraper::standalone;

#[derive(Parser)]
#[command(name = "airbnb-page-scraper")]
#[command(about = "Scrape paginated Airbnb search results with headless Chrome")]
struct Cli {
    /// Config file (defaults to ./config.yaml, then next to the binary)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Scrape a single page of the search URL found in the environment
    Once {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

fn find_config_path() -> PathBuf {
    let candidates = [
        PathBuf::from("config.yaml"),
        binary_dir().join("config.yaml"),
    ];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn build_scraper(config: &Config) -> Result<Arc<PageScraper>> {
    let launcher = Arc::new(ChromiumLauncher::new(config.browser.clone()));
    let scraper = PageScraper::new(
        launcher,
        config.scraper.clone(),
        config.readiness.clone(),
        config.selectors.clone(),
        config.server.max_concurrent_sessions,
    )
    .context("invalid selector configuration")?;
    Ok(Arc::new(scraper))
}

/// `PORT` wins over the configured port when it parses.
fn listen_port(configured: u16) -> u16 {
    match std::env::var("PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Ignoring unparsable PORT");
            configured
        }),
        Err(_) => configured,
    }
}

async fn serve(config: Config) -> Result<ExitCode> {
    let scraper = build_scraper(&config)?;
    let port = listen_port(config.server.port);
    let listener = TcpListener::bind((config.server.host.as_str(), port))
        .await
        .with_context(|| format!("could not bind {}:{port}", config.server.host))?;

    server::serve(listener, AppState { scraper }).await?;
    Ok(ExitCode::SUCCESS)
}

async fn once(config: Config, page: u32) -> Result<ExitCode> {
    let var = &config.scraper.url_env;
    let today = chrono::Local::now().date_naive();
    let request = match standalone::request_from_env(
        var,
        std::env::var(var).ok(),
        page,
        config.scraper.page_size,
        today,
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, var = %var, "Cannot run a one-shot scrape");
            return Ok(ExitCode::FAILURE);
        }
    };

    let scraper = build_scraper(&config)?;
    let result = scraper.scrape_page(&request).await?;

    print!("{result}");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(ExitCode::from(standalone::exit_status(&result)))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so `once` can print JSON on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(find_config_path);
    let config = load_config(&config_path)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("Starting airbnb-page-scraper server");
            serve(config).await
        }
        Command::Once { page } => once(config, page).await,
    }
}
