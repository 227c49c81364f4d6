use clap::{Parser, ValueEnum};
use mdvault_config::ConfigLayer;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "mdvault-mcp")]
#[command(about = "MCP server exposing a markdown vault over stdio")]
#[command(version)]
pub struct Cli {
    /// Vault root directory (overrides MARKDOWN_VAULT_PATH)
    #[arg(short = 'v', long)]
    pub vault: Option<PathBuf>,

    /// Config file path (defaults to ~/.config/mdvault/config.toml)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// strftime pattern for daily notes, relative to the vault
    #[arg(long)]
    pub daily_note_format: Option<String>,

    /// Name or path of the vault CLI used for delegated tools
    #[arg(long)]
    pub cli_binary: Option<String>,

    /// Set log level (off, error, warn, info, debug, trace).
    /// If not specified, uses RUST_LOG or defaults to 'info'
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Settings given on the command line, which win over every other source
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            vault_path: self.vault.clone(),
            daily_note_format: self.daily_note_format.clone(),
            cli_binary: self.cli_binary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_everything_to_config() {
        let cli = Cli::try_parse_from(["mdvault-mcp"]).unwrap();
        assert_eq!(cli.overrides(), ConfigLayer::default());
        assert!(cli.log_level.is_none());
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "mdvault-mcp",
            "--vault",
            "/notes",
            "--daily-note-format",
            "journal/%Y-%m-%d.md",
            "--cli-binary",
            "/opt/mdv",
            "-l",
            "debug",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.vault_path, Some(PathBuf::from("/notes")));
        assert_eq!(
            overrides.daily_note_format.as_deref(),
            Some("journal/%Y-%m-%d.md")
        );
        assert_eq!(overrides.cli_binary.as_deref(), Some("/opt/mdv"));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["mdvault-mcp", "--log-level", "loud"]).is_err());
    }
}
