//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::AnalysisRoute;
use crate::models::RiskLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clausewise - contract risk analysis and legal term explanation
///
/// Sends contract text to the analysis service, renders the flagged
/// clauses, and explains legal terms from a local glossary with a
/// remote fallback.
///
/// Examples:
///   clausewise analyze --file nda.txt
///   echo "The supplier may terminate at will." | clausewise analyze
///   clausewise upload lease.pdf --format json
///   clausewise --glossary dictionary.json explain "force majeure"
///   clausewise health --watch --interval 30
///   clausewise init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// API gateway base URL
    #[arg(long, global = true, value_name = "URL", env = "CLAUSEWISE_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, global = true, env = "CLAUSEWISE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Glossary file path or URL
    #[arg(long, global = true, value_name = "PATH")]
    pub glossary: Option<String>,

    /// Skip the local glossary
    #[arg(long, global = true)]
    pub no_glossary: bool,

    /// Never ask the remote service to explain terms
    #[arg(long, global = true)]
    pub no_remote_fallback: bool,

    /// Endpoint used for risk analysis
    #[arg(long, global = true, value_name = "ROUTE")]
    pub route: Option<AnalysisRoute>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fail if findings at or above this risk level are reported
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is met.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub fail_on: Option<RiskThreshold>,

    /// Minimum risk level to include in the report
    #[arg(long, global = true, value_name = "LEVEL")]
    pub min_risk: Option<RiskThreshold>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .clausewise.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze contract text from --text, --file, or stdin
    Analyze {
        /// Title sent with the contract
        #[arg(short, long)]
        title: Option<String>,

        /// Contract text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read contract text from a file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Upload a contract file for extraction, then analyze it
    Upload {
        /// File to upload
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Title for the analysis (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Explain one or more legal terms
    Explain {
        /// Terms to explain
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },

    /// List previously analyzed contracts
    History,

    /// Check whether the API gateway is up
    Health {
        /// Keep probing on an interval until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds between probes in --watch mode
        #[arg(long, default_value = "30", value_name = "SECS")]
        interval: u64,
    },

    /// Generate a default .clausewise.toml configuration file
    InitConfig,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Risk level for --fail-on and --min-risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum RiskThreshold {
    Low,
    Medium,
    High,
}

impl From<RiskThreshold> for RiskLevel {
    fn from(threshold: RiskThreshold) -> Self {
        match threshold {
            RiskThreshold::Low => RiskLevel::Low,
            RiskThreshold::Medium => RiskLevel::Medium,
            RiskThreshold::High => RiskLevel::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match self.command {
            Command::Analyze {
                file: Some(ref path),
                ..
            }
            | Command::Upload { ref path, .. } => {
                if !path.is_file() {
                    return Err(format!("File does not exist: {}", path.display()));
                }
            }
            Command::Health { interval: 0, .. } => {
                return Err("Interval must be at least 1 second".to_string());
            }
            Command::Explain { ref terms } if terms.iter().all(|t| t.trim().is_empty()) => {
                return Err("At least one non-empty term is required".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            api_url: None,
            api_key: None,
            timeout: None,
            glossary: None,
            no_glossary: false,
            no_remote_fallback: false,
            route: None,
            format: OutputFormat::Markdown,
            output: None,
            fail_on: None,
            min_risk: None,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_explain() {
        let args = Args::try_parse_from(["clausewise", "explain", "force majeure", "lien"]).unwrap();
        match args.command {
            Command::Explain { terms } => assert_eq!(terms, ["force majeure", "lien"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "clausewise",
            "analyze",
            "--text",
            "clause",
            "--route",
            "llm",
            "--fail-on",
            "high",
        ])
        .unwrap();
        assert_eq!(args.route, Some(AnalysisRoute::Llm));
        assert_eq!(args.fail_on, Some(RiskThreshold::High));
    }

    #[test]
    fn test_text_and_file_conflict() {
        let parsed = Args::try_parse_from([
            "clausewise", "analyze", "--text", "a", "--file", "b.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(Command::History);
        args.api_url = Some("gateway:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::History);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_upload_file() {
        let args = make_args(Command::Upload {
            path: PathBuf::from("/nonexistent/contract.pdf"),
            title: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let args = make_args(Command::Health {
            watch: true,
            interval: 0,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_threshold_conversion() {
        assert_eq!(RiskLevel::from(RiskThreshold::Medium), RiskLevel::Medium);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::History);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
