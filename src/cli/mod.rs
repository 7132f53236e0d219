//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `analyze <REFERENCE>` -- run one report pipeline
//! - `config show|path` -- inspect configuration
//! - `version` -- print build/version info

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::channels::{ConsoleChannel, ReportChannel, TelegramChannel};
use crate::config::{self, Config};
use crate::logging;
use crate::pipeline::{Pipeline, PipelineOutcome};

/// Technical reports for media files on Google Drive or behind direct links.
#[derive(Parser, Debug)]
#[command(
    name = "mediareport",
    version = env!("CARGO_PKG_VERSION"),
    about = "Container, video, audio and subtitle reports from the first megabytes of a file"
)]
pub struct Cli {
    /// Config file (default: $CONFIG_DIR/mediareport/config.json5)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a Drive link, Drive file id or direct URL.
    Analyze {
        /// The reference to analyze.
        reference: String,

        /// Report to the configured Telegram chat instead of the terminal.
        #[arg(long)]
        telegram: bool,

        /// Print the outcome as JSON after the report.
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets redacted) as JSON.
    Show,

    /// Print the default configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

/// Run the `analyze` subcommand. Returns whether a report was delivered.
pub async fn handle_analyze(
    config_path: Option<&Path>,
    reference: &str,
    telegram: bool,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let cfg = config::load(config_path)?;
    logging::init_logging(&cfg.logging)?;

    let pipeline = Pipeline::from_config(&cfg)?;

    let outcome = if telegram {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        let channel = TelegramChannel::from_config(client, &cfg.telegram)?
            .with_caption_cap(cfg.caption_length_cap);
        run(&pipeline, reference, &channel).await
    } else {
        let console = ConsoleChannel::new();
        let outcome = run(&pipeline, reference, &console).await;
        console.finish(&mut std::io::stdout().lock())?;
        outcome
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(outcome.is_delivered())
}

async fn run(pipeline: &Pipeline, reference: &str, channel: &dyn ReportChannel) -> PipelineOutcome {
    pipeline.analyze(reference, channel).await
}

/// Run the `config show` subcommand.
pub fn handle_config_show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load(config_path)?;
    println!("{}", render_config(&cfg)?);
    Ok(())
}

fn render_config(cfg: &Config) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&cfg.redacted())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    match config::default_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(no configuration directory on this platform)"),
    }
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("mediareport {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("MEDIAREPORT_BUILD_DATE"));
    println!("  Git commit: {}", env!("MEDIAREPORT_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_analyze() {
        let cli = Cli::try_parse_from(["mediareport", "analyze", "https://example.com/a.mkv"])
            .unwrap();
        match cli.command {
            Command::Analyze {
                ref reference,
                telegram,
                json,
            } => {
                assert_eq!(reference, "https://example.com/a.mkv");
                assert!(!telegram);
                assert!(!json);
            }
            other => panic!("Expected Analyze, got {:?}", other),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_analyze_flags() {
        let cli = Cli::try_parse_from([
            "mediareport",
            "analyze",
            "--telegram",
            "--json",
            "--config",
            "/tmp/c.json5",
            "abc",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Analyze {
                telegram: true,
                json: true,
                ..
            }
        ));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json5")));
    }

    #[test]
    fn test_cli_analyze_requires_reference() {
        assert!(Cli::try_parse_from(["mediareport", "analyze"]).is_err());
    }

    #[test]
    fn test_cli_subcommand_required() {
        assert!(Cli::try_parse_from(["mediareport"]).is_err());
    }

    #[test]
    fn test_cli_version_subcommand() {
        let cli = Cli::try_parse_from(["mediareport", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn test_cli_config_show() {
        let cli = Cli::try_parse_from(["mediareport", "config", "show"]).unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Show) => {}
            other => panic!("Expected Config(Show), got {:?}", other),
        }
    }

    #[test]
    fn test_cli_config_path() {
        let cli = Cli::try_parse_from(["mediareport", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }

    #[test]
    fn test_render_config_redacts() {
        let mut cfg = Config::default();
        cfg.image_service.api_key = Some("hcti-secret".to_string());
        let shown = render_config(&cfg).unwrap();
        assert!(!shown.contains("hcti-secret"));
        assert!(shown.contains("maxDownloadBytes"));
    }
}
