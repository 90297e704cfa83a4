mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use mcp::HttpClient;
use runtime::{OllamaBackend, Orchestrator, ToolRegistry};
use server::{ToolRouter, ToolRouterConfig};
use storage::MetadataStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{CONFIG_FILE, Config};
use error::{Error, Result};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "çık"];

#[derive(Parser)]
#[command(name = "geoagent")]
#[command(about = "Ask a local model to analyze, crop and sample GeoTIFF rasters", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: std::path::PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive assistant
    Chat,
    /// Serve the raster tools over HTTP
    Serve,
    /// List analyzed raster metadata, newest first
    Records {
        /// Show only the last N records
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(&config).await,
        Some(Commands::Serve) => cmd_serve(&config).await,
        Some(Commands::Records { limit }) => cmd_records(&config, limit),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn cmd_chat(config: &Config) -> Result<()> {
    let model = OllamaBackend::builder(&config.model.base_url, &config.model.model)
        .timeout(config.model.timeout())
        .build()?;
    let transport = HttpClient::new(&config.server.url, config.server.timeout())?;
    let orchestrator = Orchestrator::new(model, transport, ToolRegistry::raster());

    println!("geoagent v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: {}", config.model.model);
    println!("Tool server: {}", config.server.url);
    println!("Type 'quit' or Ctrl+D to exit.\n");

    if let Err(e) = chat_loop(&orchestrator).await {
        println!("\nExiting due to error: {e}");
    }
    Ok(())
}

/// Read requests until an exit word or EOF. Only stdin/stdout faults end
/// the loop early; per-request failures are printed and skipped.
async fn chat_loop(orchestrator: &Orchestrator<OllamaBackend, HttpClient>) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_word(input) {
            println!("Exiting...");
            break;
        }

        match orchestrator.handle(input).await {
            Ok(reports) => {
                for report in reports {
                    println!("\n{report}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("Error: {e}\n");
            }
        }
    }
    Ok(())
}

fn is_exit_word(input: &str) -> bool {
    let input = input.to_lowercase();
    EXIT_WORDS.contains(&input.as_str())
}

async fn cmd_serve(config: &Config) -> Result<()> {
    let paths = &config.paths;
    std::fs::create_dir_all(&paths.temp_dir)?;
    std::fs::create_dir_all(&paths.output_dir)?;

    let store = MetadataStore::open(&paths.database)?;
    info!(database = %paths.database.display(), "metadata store opened");

    let tools = Arc::new(ToolRouter::new(ToolRouterConfig {
        output_dir: paths.output_dir.clone(),
        sink: Arc::new(Mutex::new(store)),
    }));

    let listener = TcpListener::bind(&config.server.bind).await?;
    let served = server::serve(listener, tools, shutdown_signal()).await;

    server::clear_dir(&paths.temp_dir)?;
    info!(temp_dir = %paths.temp_dir.display(), "temp directory cleared");
    Ok(served?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
    }
}

fn cmd_records(config: &Config, limit: usize) -> Result<()> {
    let path = &config.paths.database;
    if !path.exists() {
        return Err(Error::DatabaseNotFound { path: path.clone() });
    }
    let store = MetadataStore::open(path)?;
    let records = store.list(limit)?;

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<24}  {:<6}  {:<14}  SIZE (MB)",
        "RECORD ID", "UPLOADED", "FILENAME", "EPSG", "BANDS"
    );
    println!("{}", "-".repeat(116));

    for stored in records {
        let record = &stored.record;
        let uploaded = Local
            .from_utc_datetime(&record.uploaded_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let epsg = record
            .epsg
            .map_or_else(|| "-".to_string(), |code| code.to_string());
        println!(
            "{:<36}  {:<16}  {:<24}  {:<6}  {:<14}  {:.2}",
            stored.id.to_string(),
            uploaded.to_string(),
            record.filename,
            epsg,
            record.band_type,
            record.file_size_mb
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit_word("quit"));
        assert!(is_exit_word("EXIT"));
        assert!(is_exit_word("Çık"));
        assert!(!is_exit_word("quit now"));
    }

    #[test]
    fn cli_parses_records_limit() {
        let cli = Cli::try_parse_from(["geoagent", "records", "--limit", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Records { limit: 3 })));
        assert!(!cli.verbose);
    }

    #[test]
    fn chat_is_the_default() {
        let cli = Cli::try_parse_from(["geoagent", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
