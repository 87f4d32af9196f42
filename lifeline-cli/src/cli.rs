//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lifeline", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// GET a URL with retries, offline queuing and result caching
    Fetch {
        /// URL to request
        #[arg(value_name = "URL")]
        url: String,

        /// Seconds a successful response stays cached
        #[arg(long, value_name = "SECONDS")]
        cache_ttl: Option<u64>,

        /// Attempt bound for the request
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,

        /// Backoff unit in milliseconds
        #[arg(long, value_name = "MS")]
        retry_delay_ms: Option<u64>,

        /// Fail instead of queuing when offline
        #[arg(long)]
        no_queue: bool,

        /// Issue the same request this many times
        #[arg(long, value_name = "N", default_value = "1")]
        repeat: u32,
    },

    /// Check reachability once using the configured probe
    Probe,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the file given with --config
    Validate,

    /// Print or write a sample configuration file
    Generate {
        /// Output file path (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::try_parse_from([
            "lifeline",
            "--log-level",
            "debug",
            "fetch",
            "https://example.com/feed",
            "--cache-ttl",
            "30",
            "--max-retries",
            "5",
            "--no-queue",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Commands::Fetch {
                url,
                cache_ttl,
                max_retries,
                retry_delay_ms,
                no_queue,
                repeat,
            }) => {
                assert_eq!(url, "https://example.com/feed");
                assert_eq!(cache_ttl, Some(30));
                assert_eq!(max_retries, Some(5));
                assert_eq!(retry_delay_ms, None);
                assert!(no_queue);
                assert_eq!(repeat, 1);
            }
            _ => panic!("expected fetch command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["lifeline", "config", "validate", "--config", "lifeline.yaml"])
            .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("lifeline.yaml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                config_cmd: ConfigCommands::Validate
            })
        ));
    }

    #[test]
    fn test_fetch_requires_url() {
        assert!(Cli::try_parse_from(["lifeline", "fetch"]).is_err());
    }
}
