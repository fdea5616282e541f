//! Clausewise - contract risk analysis and legal term explanation
//!
//! A CLI front end over the analysis core: every subcommand is a thin
//! event source that calls the orchestrator or the term explainer and
//! renders their canonical output.
//!
//! Exit codes:
//!   0 - Success (no findings above threshold, or no --fail-on set)
//!   1 - Runtime error (connection, config, upload failure, unhealthy service, etc.)
//!   2 - Findings at or above the --fail-on threshold

mod analysis;
mod cli;
mod client;
mod config;
mod coordinator;
mod error;
mod explain;
mod glossary;
mod health;
mod models;
mod report;

use analysis::{retain_min_level, ContractAnalysisOrchestrator};
use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use client::http::ApiConfig;
use client::{ContractApi, HttpContractApi, UploadFile};
use config::{Config, CONFIG_FILE};
use coordinator::until_canceled;
use explain::{ExplainPolicy, TermExplainer};
use glossary::{GlossaryResolver, GlossarySource};
use health::HealthMonitor;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisRequest, AnalysisResult, RiskLevel};
use report::AnalysisReport;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Clausewise v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .clausewise.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the service URL, API key, glossary and feature flags.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let api: Arc<dyn ContractApi> = Arc::new(HttpContractApi::new(ApiConfig {
        base_url: config.service.base_url.clone(),
        timeout_seconds: config.service.timeout_seconds,
        api_key: config.service.api_key.clone(),
    })?);

    // Ctrl-C withdraws interest in whatever is in flight
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, canceling in-flight requests");
                cancel.cancel();
            }
        }
    });

    match args.command.clone() {
        Command::Analyze { title, text, file } => {
            let (content, fallback_title) =
                read_contract_text(text, file.as_deref(), &cancel).await?;
            let fallback_title = fallback_title.unwrap_or_else(|| config.analysis.default_title.clone());
            let request = AnalysisRequest::new(title.as_deref(), content, &fallback_title);

            spawn_health_probe(&api);
            let orchestrator = ContractAnalysisOrchestrator::new(Arc::clone(&api), config.analysis.route);

            let start = Instant::now();
            let spinner = spinner(&args, "Analyzing contract...");
            let title = request.title.clone();
            let outcome = orchestrator.analyze_text(request, &cancel).await;
            spinner.finish_and_clear();

            finish_analysis(&args, &config, &title, outcome?, start)
        }
        Command::Upload { path, title } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file = UploadFile {
                file_name: file_name(&path),
                bytes,
            };
            let title = title.unwrap_or_default();
            let display_title = if title.trim().is_empty() {
                file.file_name.clone()
            } else {
                title.clone()
            };

            spawn_health_probe(&api);
            let orchestrator = ContractAnalysisOrchestrator::new(Arc::clone(&api), config.analysis.route);

            let start = Instant::now();
            let spinner = spinner(&args, "Uploading and analyzing contract...");
            let outcome = orchestrator.analyze_upload(file, &title, &cancel).await;
            spinner.finish_and_clear();

            finish_analysis(&args, &config, &display_title, outcome?, start)
        }
        Command::Explain { terms } => run_explain(&args, &config, api, terms, &cancel).await,
        Command::History => {
            let orchestrator = ContractAnalysisOrchestrator::new(api, config.analysis.route);
            let records = until_canceled(&cancel, orchestrator.history()).await??;

            let output = match args.format {
                OutputFormat::Json => report::generate_json_history(&records)?,
                OutputFormat::Markdown => report::generate_history_listing(&records),
            };
            emit(&args, &output)?;
            Ok(0)
        }
        Command::Health { watch, interval } => {
            run_health(HealthMonitor::new(api), watch, interval, &cancel).await
        }
        Command::InitConfig => handle_init_config().map(|_| 0),
    }
}

/// Render, write and threshold-check an analysis result.
fn finish_analysis(
    args: &Args,
    config: &Config,
    title: &str,
    mut result: AnalysisResult,
    start: Instant,
) -> Result<i32> {
    let duration = start.elapsed().as_secs_f64();

    // Threshold is checked before --min-risk hides anything
    let threshold_met = args
        .fail_on
        .map(|level| result.has_findings_at_or_above(RiskLevel::from(level)));

    if let Some(min) = args.min_risk {
        retain_min_level(&mut result.findings, RiskLevel::from(min));
    }

    let report = AnalysisReport::new(title, config.analysis.route.endpoint(), result, duration);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, config.features.risk_tags),
    };
    emit(args, &output)?;

    if !args.quiet {
        eprintln!("\n📊 {}", report::generate_summary_line(&report));
        eprintln!("   Duration: {:.1}s", duration);
    }

    if let (Some(true), Some(level)) = (threshold_met, args.fail_on) {
        eprintln!("\n{}", report::generate_threshold_notice(RiskLevel::from(level)));
        return Ok(2);
    }

    Ok(0)
}

/// Explain each term, glossary first.
async fn run_explain(
    args: &Args,
    config: &Config,
    api: Arc<dyn ContractApi>,
    terms: Vec<String>,
    cancel: &CancellationToken,
) -> Result<i32> {
    let resolver = Arc::new(GlossaryResolver::new(Duration::from_secs(
        config.service.timeout_seconds,
    )));

    if config.features.glossary {
        match config.glossary.path {
            Some(ref location) => {
                let source = GlossarySource::from_location(location);
                if let Err(e) = until_canceled(cancel, resolver.load(&source)).await? {
                    warn!("Glossary unavailable, continuing without local definitions: {}", e);
                }
            }
            None => debug!("No glossary configured"),
        }
    }

    let policy = ExplainPolicy {
        use_glossary: config.features.glossary,
        remote_fallback: config.features.remote_fallback,
    };
    let explainer = TermExplainer::new(resolver, api, policy);

    let mut explanations = Vec::new();
    for term in &terms {
        match explainer.explain(term, cancel).await {
            Ok(explanation) => explanations.push(explanation),
            Err(error::AssistError::InvalidInput(msg)) => {
                warn!("Skipping term: {}", msg);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json_explanations(&explanations)?,
        OutputFormat::Markdown => explanations
            .iter()
            .map(report::generate_explanation)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    emit(args, &output)?;

    Ok(0)
}

/// Probe once, or keep probing until interrupted.
async fn run_health(
    monitor: HealthMonitor,
    watch: bool,
    interval_secs: u64,
    cancel: &CancellationToken,
) -> Result<i32> {
    if !watch {
        let status = until_canceled(cancel, monitor.probe()).await?;
        println!("{} API gateway is {}", status_icon(status.is_healthy()), status);
        return Ok(if status.is_healthy() { 0 } else { 1 });
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Ok(status) = until_canceled(cancel, monitor.probe()).await else {
                    break;
                };
                println!(
                    "[{}] {} API gateway is {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    status_icon(status.is_healthy()),
                    status
                );
            }
        }
    }

    Ok(match monitor.last_status() {
        Some(status) if !status.is_healthy() => 1,
        _ => 0,
    })
}

fn status_icon(healthy: bool) -> &'static str {
    if healthy {
        "✅"
    } else {
        "⚠️"
    }
}

/// Fire an advisory health probe without waiting on it.
fn spawn_health_probe(api: &Arc<dyn ContractApi>) {
    let monitor = HealthMonitor::new(Arc::clone(api));
    tokio::spawn(async move {
        monitor.probe().await;
    });
}

/// Contract text from --text, --file or stdin, plus a title fallback.
async fn read_contract_text(
    text: Option<String>,
    file: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<(String, Option<String>)> {
    if let Some(text) = text {
        return Ok((text, None));
    }

    if let Some(path) = file {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok((content, Some(file_name(path))));
    }

    info!("Reading contract text from stdin");
    let reader = tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map(|_| buf)
    });
    // The blocked reader thread is abandoned on cancel; the process exits right after
    let content = until_canceled(cancel, reader)
        .await?
        .context("Failed to join stdin reader")?
        .context("Failed to read stdin")?;

    Ok((content, None))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Write output to --output or stdout.
fn emit(args: &Args, output: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn spinner(args: &Args, message: &'static str) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
