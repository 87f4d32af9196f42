use anyhow::{Context, Result};
use clap::Parser;
use lifeline_config::{ConfigLoader, LifelineConfig, LogLevel};
use lifeline_core::report_platform_error;
use lifeline_logging::{init_logging_from_config, init_simple_tracing};
use lifeline_resilience::{ExecutionConfig, HttpProbe, ResilienceStack};
use reqwest::Client;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod cli;
mod fetch;

use cli::{Cli, Commands, ConfigCommands};
use fetch::{fetch_page, FetchedPage};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<LifelineConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize logging from configuration with fallback to simple tracing
fn init_logging_with_config(config: &LifelineConfig, log_level: Option<&String>) -> Result<()> {
    // If CLI log level is provided, override config level
    let mut logging_config = config.logging.clone();
    if let Some(level_str) = log_level {
        match level_str.parse::<LogLevel>() {
            Ok(level) => logging_config.level = level,
            Err(e) => eprintln!("{}, keeping '{}'", e, logging_config.level),
        }
    }

    if let Err(e) = init_logging_from_config(&logging_config) {
        eprintln!(
            "Failed to initialize structured logging: {}, falling back to simple tracing",
            e
        );
        init_simple_tracing(&logging_config.level.to_string())?;
    }

    Ok(())
}

/// Handle configuration validation
fn handle_config_validate(config_file: Option<&PathBuf>) -> Result<()> {
    let config_file = config_file.context("Pass the file to validate with --config")?;
    info!("Validating configuration file: {:?}", config_file);

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: Option<&PathBuf>, force: bool) -> Result<()> {
    let sample = LifelineConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", sample);
        return Ok(());
    };

    info!("Generating configuration at: {:?}", output);

    // Check if file exists and force is not set
    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    // Create parent directory if it doesn't exist
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, sample).context("Failed to write configuration file")?;
    println!("Configuration written to {:?}", output);
    Ok(())
}

struct FetchArgs<'a> {
    url: &'a str,
    cache_ttl: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    no_queue: bool,
    repeat: u32,
}

/// GET a URL through the resilience stack
async fn handle_fetch(config: &LifelineConfig, args: FetchArgs<'_>) -> Result<ExitCode> {
    let stack = ResilienceStack::from_config(config).context("Failed to build resilience stack")?;
    stack.start();

    let mut execution = ExecutionConfig::from(&config.execution);
    if let Some(max_retries) = args.max_retries {
        execution = execution.with_max_retries(max_retries);
    }
    if let Some(delay_ms) = args.retry_delay_ms {
        execution = execution.with_retry_delay(Duration::from_millis(delay_ms));
    }
    if args.no_queue {
        execution = execution.with_offline_queue(false);
    }

    let ttl = args
        .cache_ttl
        .map(Duration::from_secs)
        .unwrap_or(config.cache.default_ttl);

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    for round in 1..=args.repeat.max(1) {
        let fetched = Arc::new(AtomicBool::new(false));

        let action = {
            let client = client.clone();
            let url = args.url.to_string();
            let fetched = fetched.clone();
            move || {
                let client = client.clone();
                let url = url.clone();
                let fetched = fetched.clone();
                async move {
                    fetched.store(true, Ordering::SeqCst);
                    fetch_page(&client, &url).await
                }
            }
        };

        let result: Result<FetchedPage, _> = stack
            .executor()
            .cached(args.url, ttl, action, &execution)
            .await;

        match result {
            Ok(page) => {
                let source = if fetched.load(Ordering::SeqCst) {
                    "network"
                } else {
                    "cache"
                };
                println!(
                    "[{}] {} -> HTTP {}, {} bytes (from {})",
                    round,
                    args.url,
                    page.status,
                    page.body.len(),
                    source
                );
            }
            Err(e) => {
                report_platform_error(&e);
                eprintln!("[{}] {}", round, e.user_message());
                if e.is_queued() {
                    eprintln!("Request queued for later ({} pending)", stack.queue().len());
                }
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Probe reachability once
async fn handle_probe(config: &LifelineConfig) -> Result<ExitCode> {
    let probe = HttpProbe::from_config(&config.connectivity).context("Failed to build probe")?;

    if probe.check().await {
        println!("{} is reachable", probe.url());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} is not reachable", probe.url());
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Configuration commands work on files and do not need the full stack
    if let Some(Commands::Config { config_cmd }) = &cli.command {
        init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
        match config_cmd {
            ConfigCommands::Validate => handle_config_validate(cli.config.as_ref())?,
            ConfigCommands::Generate { output, force } => {
                handle_config_generate(output.as_ref(), *force)?
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Load configuration first
    let config = load_config(cli.config.as_ref())?;
    init_logging_with_config(&config, cli.log_level.as_ref())?;

    info!("Lifeline CLI starting");

    match &cli.command {
        Some(Commands::Fetch {
            url,
            cache_ttl,
            max_retries,
            retry_delay_ms,
            no_queue,
            repeat,
        }) => {
            handle_fetch(
                &config,
                FetchArgs {
                    url,
                    cache_ttl: *cache_ttl,
                    max_retries: *max_retries,
                    retry_delay_ms: *retry_delay_ms,
                    no_queue: *no_queue,
                    repeat: *repeat,
                },
            )
            .await
        }
        Some(Commands::Probe) => handle_probe(&config).await,
        Some(Commands::Config { .. }) => Ok(ExitCode::SUCCESS),
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}
