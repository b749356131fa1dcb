use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use factcheck_core::config_file::{self, ConfigFile};
use factcheck_core::search::HttpSearch;
use factcheck_core::store::reset_pending;
use factcheck_core::{Config, Coordinator, CoreError, RequestMethod, StateStore};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod output;

use output::{ColorMode, TerminalSink};

/// Fact Checker - submit claims to a fact-check service and review the verdicts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fact-check service endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request style: get or post
    #[arg(long, global = true)]
    method: Option<RequestMethod>,

    /// Records requested per query
    #[arg(long, global = true)]
    limit: Option<u32>,

    /// Path to the persistent state database
    #[arg(long, global = true, conflicts_with = "ephemeral")]
    state: Option<PathBuf>,

    /// Keep state in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Query the configured endpoint instead of the built-in demo service
    #[arg(long, global = true, conflicts_with = "dummy")]
    live: bool,

    /// Use the built-in demo service
    #[arg(long, global = true)]
    dummy: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fact-check one or more claims (reads one claim per line from stdin if none given)
    Check {
        /// Claims to check
        query: Vec<String>,

        /// Print the new records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show accumulated results, newest first
    List {
        /// Print the full state as JSON
        #[arg(long)]
        json: bool,

        /// Show at most this many records
        #[arg(short = 'n', long)]
        max: Option<usize>,
    },

    /// Remove all results and reset the pending count
    Clear {
        /// Only reset a pending count left behind by an interrupted run
        #[arg(long)]
        pending_only: bool,
    },

    /// Check that the fact-check service is reachable
    Ping,

    /// Print the resolved configuration
    Config {
        /// Write the resolved service settings to the platform config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let file = config_file::load_config();
    let config = resolve_config(&cli, &file, |key| std::env::var(key).ok());
    let color = ColorMode(!cli.no_color && std::io::stdout().is_terminal());

    match cli.command {
        Command::Check { query, json } => check(&config, query, json, color).await,
        Command::List { json, max } => list(&config, json, max, color),
        Command::Clear { pending_only } => clear(&config, pending_only),
        Command::Ping => ping(&config).await,
        Command::Config { save } => show_config(&config, &file, save),
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(
    cli: &Cli,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> Config {
    let mut config = file.resolve();

    if let Some(endpoint) = cli.endpoint.clone().or_else(|| env("FACTCHECK_ENDPOINT")) {
        config.endpoint = endpoint;
    }
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let Some(limit) = cli.limit {
        config.result_limit = limit.max(1);
    }
    if let Some(dummy) = env("FACTCHECK_USE_DUMMY_API").and_then(|v| parse_bool(&v)) {
        config.use_dummy_api = dummy;
    }
    if cli.live {
        config.use_dummy_api = false;
    }
    if cli.dummy {
        config.use_dummy_api = true;
    }

    if cli.ephemeral {
        config.state_path = None;
    } else if let Some(path) = cli
        .state
        .clone()
        .or_else(|| env("FACTCHECK_STATE_PATH").map(PathBuf::from))
    {
        config.state_path = Some(path);
    }
    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Claims from the command line, or one per non-empty stdin line when piped.
fn collect_queries(args: Vec<String>) -> anyhow::Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("No claim given. Pass one as an argument or pipe claims on stdin.");
    }
    let mut input = String::new();
    stdin.lock().read_to_string(&mut input)?;
    Ok(input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

async fn check(
    config: &Config,
    args: Vec<String>,
    json: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let queries = collect_queries(args)?;
    if queries.is_empty() {
        anyhow::bail!("Please enter text to fact-check");
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {prefix} {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(120));

    let sink = Arc::new(TerminalSink::new(bar.clone(), color));
    let store = factcheck_core::build_store(config.state_path.as_deref())?;
    let coordinator = Coordinator::new(
        store,
        factcheck_core::build_backend(config)?,
        sink.clone(),
        sink,
        config.result_limit,
    );
    tracing::info!(
        backend = coordinator.backend_name(),
        queries = queries.len(),
        "submitting"
    );

    let started = Utc::now();
    let mut handles = Vec::new();
    let mut submitted = Vec::new();
    for query in &queries {
        match coordinator.submit_query(query) {
            Ok(handle) => {
                handles.push(handle);
                submitted.push(query.trim().to_string());
            }
            Err(CoreError::EmptyQuery) => bar.println("Skipping empty claim"),
            Err(e) => return Err(e.into()),
        }
    }
    bar.set_prefix(format!("{} claim(s)", handles.len()));

    let wait_all = async {
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "fact check task panicked");
            }
        }
    };
    tokio::select! {
        _ = wait_all => {}
        _ = tokio::signal::ctrl_c() => {
            bar.finish_and_clear();
            let released = coordinator.shutdown()?;
            eprintln!("Interrupted; released {} unfinished check(s)", released);
            return Ok(());
        }
    }
    bar.finish_and_clear();

    let state = coordinator.state()?;
    let fresh: Vec<_> = state
        .results
        .iter()
        .filter(|r| r.checked_at >= started && submitted.contains(&r.original_query))
        .cloned()
        .collect();

    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&fresh)?)?;
        return Ok(());
    }
    let view = factcheck_core::AccumulatedState {
        results: fresh,
        pending_checks: state.pending_checks,
    };
    output::print_state(&mut out, &view, None, color)?;
    Ok(())
}

fn list(config: &Config, json: bool, max: Option<usize>, color: ColorMode) -> anyhow::Result<()> {
    let store = factcheck_core::build_store(config.state_path.as_deref())?;
    let state = store.load()?;
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&state)?)?;
    } else {
        output::print_state(&mut out, &state, max, color)?;
    }
    Ok(())
}

fn clear(config: &Config, pending_only: bool) -> anyhow::Result<()> {
    let store = factcheck_core::build_store(config.state_path.as_deref())?;
    if pending_only {
        let stale = reset_pending(store.as_ref())?;
        println!("Reset {} stale pending check(s)", stale);
        return Ok(());
    }

    let coordinator = Coordinator::new(
        store,
        factcheck_core::build_backend(config)?,
        Arc::new(factcheck_core::TracingSink),
        Arc::new(factcheck_core::TracingSink),
        config.result_limit,
    );
    coordinator.clear_all()?;
    println!("Cleared all results");
    Ok(())
}

async fn ping(config: &Config) -> anyhow::Result<()> {
    if config.use_dummy_api {
        println!("Using the built-in demo service; pass --live to ping {}", config.endpoint);
        return Ok(());
    }
    let search = HttpSearch::new(config.endpoint.clone(), config.method, config.timeout())?;
    match search.check_connectivity().await {
        Ok(()) => {
            println!("{} is reachable", config.endpoint);
            Ok(())
        }
        Err(e) => anyhow::bail!(e),
    }
}

fn show_config(config: &Config, file: &ConfigFile, save: bool) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    output::print_config(&mut out, config, config_file::config_path().as_deref())?;
    if save {
        let mut updated = file.clone();
        updated.service = Some(config_file::ServiceConfig {
            endpoint: Some(config.endpoint.clone()),
            method: Some(config.method.to_string()),
            result_limit: Some(config.result_limit),
            timeout_secs: Some(config.timeout_secs),
            use_dummy_api: Some(config.use_dummy_api),
            dummy_delay_ms: Some(config.dummy_delay_ms),
        });
        let path = config_file::save_config(&updated).map_err(anyhow::Error::msg)?;
        writeln!(out, "Saved to {}", path.display())?;
    }
    Ok(())
}
