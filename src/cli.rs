//! Command-line argument parsing for DataQuest.

use crate::config::{BackendConfig, Config};
use clap::Parser;
use std::path::PathBuf;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output of the final screen.
    #[default]
    Text,
    /// JSON output with screen, state, and metadata.
    Json,
    /// Frame-by-frame output showing state after each event.
    Frames,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "frames" => Ok(Self::Frames),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text, json, or frames"
            )),
        }
    }
}

/// Ask questions in plain English, review the generated SQL, run it.
#[derive(Parser, Debug)]
#[command(name = "dataquest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the query backend (e.g., http://localhost:8000)
    #[arg(short = 'b', long, value_name = "URL", env = "DATAQUEST_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Request timeout in seconds (default: no timeout)
    #[arg(short = 't', long, value_name = "SECS", env = "DATAQUEST_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // === Headless mode options ===
    /// Run in headless mode (no terminal UI, for testing/automation)
    #[arg(long)]
    pub headless: bool,

    /// Use the in-memory mock backend instead of HTTP
    #[arg(long)]
    pub mock_backend: bool,

    /// Comma-separated events to execute in headless mode (e.g., "type:hello,key:enter")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Path to script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT, e.g., "80x24")
    #[arg(long, value_name = "SIZE", default_value = "100x30")]
    pub size: String,

    /// Output format for headless mode
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Resolves the backend configuration.
    ///
    /// Precedence: CLI flag, then environment variable (both handled by clap),
    /// then the config file, then built-in defaults.
    pub fn backend_config(&self, file: &Config) -> BackendConfig {
        let mut backend = file.backend.clone();
        if let Some(url) = &self.backend_url {
            backend.base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            backend.timeout_secs = Some(secs);
        }
        backend
    }

    /// Returns true if headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Parses the screen size from the --size argument.
    pub fn parse_screen_size(&self) -> std::result::Result<(u16, u16), String> {
        let Some((w, h)) = self.size.split_once('x') else {
            return Err(format!(
                "Invalid size format: '{}'. Expected WIDTHxHEIGHT (e.g., 80x24)",
                self.size
            ));
        };
        let width = w
            .parse::<u16>()
            .map_err(|_| format!("Invalid width: '{w}'"))?;
        let height = h
            .parse::<u16>()
            .map_err(|_| format!("Invalid height: '{h}'"))?;
        Ok((width, height))
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            return Ok(());
        }

        if self.events.is_none() && self.script.is_none() {
            return Err("--headless requires --events or --script".to_string());
        }

        self.parse_screen_size()?;
        self.parse_output_format()?;

        Ok(())
    }
}
