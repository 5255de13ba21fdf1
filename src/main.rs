//! Rivalscope main entry point
//!
//! This is the command-line interface for the Rivalscope competitor analyzer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rivalscope::config::{load_config_with_hash, Config};
use rivalscope::fetch::Strategy;
use rivalscope::proxy::ProxyProbe;
use rivalscope::{Analyzer, SiteReport};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Rivalscope: resilient competitor intelligence
///
/// Rivalscope fetches a competitor's site through a cached, budgeted and
/// rate-limited fetcher (optionally via rotating proxies), extracts SEO,
/// content, technology and pricing signals, and diffs reports over time.
#[derive(Parser, Debug)]
#[command(name = "rivalscope")]
#[command(version)]
#[command(about = "Resilient competitor intelligence", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full analysis of one site and print the report
    Analyze {
        url: String,

        /// Fetch through a headless browser instead of plain HTTP
        #[arg(long)]
        rendered: bool,

        /// Skip probing for a pricing page
        #[arg(long)]
        no_pricing: bool,

        /// Skip probing for a features page
        #[arg(long)]
        no_features: bool,
    },

    /// Analyze a site and report changes against a saved report
    Monitor {
        url: String,

        /// Previously saved report to compare against
        #[arg(long, value_name = "REPORT")]
        baseline: Option<PathBuf>,

        /// Write the fresh report here for the next comparison
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },

    /// Proxy pool utilities
    Proxies {
        #[command(subcommand)]
        action: ProxyAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProxyAction {
    /// Probe every enabled proxy against the IP-echo service
    Test,
    /// Print an example proxy configuration section
    Template,
}

const PROXY_TEMPLATE: &str = r#"# Proxies are tried in file order; only enabled entries are loaded.
[[proxy]]
name = "Primary"
protocol = "socks5"    # http | https | socks4 | socks5
host = "proxy.example.com"
port = 1080
username = "user"      # optional
password = "secret"    # optional
enabled = true

[[proxy]]
name = "Backup"
protocol = "http"
host = "backup.example.com"
port = 8080
enabled = false
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Command::Proxies {
        action: ProxyAction::Template,
    } = cli.command
    {
        print!("{}", PROXY_TEMPLATE);
        return Ok(());
    }

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            url,
            rendered,
            no_pricing,
            no_features,
        } => handle_analyze(config, &url, rendered, no_pricing, no_features).await,
        Command::Monitor {
            url,
            baseline,
            save,
        } => handle_monitor(config, &url, baseline.as_deref(), save.as_deref()).await,
        Command::Proxies { .. } => handle_proxy_test(&config).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rivalscope=info,warn"),
            1 => EnvFilter::new("rivalscope=debug,info"),
            2 => EnvFilter::new("rivalscope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Reports go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    match load_config_with_hash(path) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e).with_context(|| format!("loading {}", path.display()))
        }
    }
}

/// Builds the analyzer, attaching a browser renderer when one is compiled in
fn build_analyzer(config: Config) -> Result<Analyzer> {
    let analyzer = Analyzer::new(config).context("initializing analyzer")?;

    #[cfg(feature = "chrome")]
    let analyzer = analyzer.with_renderer(std::sync::Arc::new(
        rivalscope::fetch::ChromeRenderer::new(),
    ));

    if cfg!(not(feature = "chrome")) && analyzer.config().fetch.strategy == Strategy::Rendered {
        tracing::warn!(
            "Rendered strategy requested but no browser backend is compiled in (enable the `chrome` feature)"
        );
    }

    Ok(analyzer)
}

/// Handles `analyze`: runs one analysis and prints the report
async fn handle_analyze(
    mut config: Config,
    url: &str,
    rendered: bool,
    no_pricing: bool,
    no_features: bool,
) -> Result<()> {
    if rendered {
        config.fetch.strategy = Strategy::Rendered;
    }
    if no_pricing {
        config.analysis.probe_pricing = false;
    }
    if no_features {
        config.analysis.probe_features = false;
    }

    let analyzer = build_analyzer(config)?;
    let report = analyzer.analyze_site(url).await;

    if let Some(error) = &report.error {
        tracing::error!("Analysis of {} failed: {}", url, error);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Handles `monitor`: diffs a fresh analysis against a saved baseline
async fn handle_monitor(
    config: Config,
    url: &str,
    baseline: Option<&Path>,
    save: Option<&Path>,
) -> Result<()> {
    let previous = baseline.map(read_report).transpose()?;

    let analyzer = build_analyzer(config)?;
    let outcome = analyzer.monitor_changes(url, previous.as_ref()).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(path) = save {
        let current = outcome.current();
        if current.is_error() {
            tracing::warn!("Not saving a failed report over {}", path.display());
        } else {
            let json = serde_json::to_string_pretty(current)?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Saved report to {}", path.display());
        }
    }

    Ok(())
}

fn read_report(path: &Path) -> Result<SiteReport> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing report {}", path.display()))
}

/// Handles `proxies test`: probes the direct connection and every proxy
async fn handle_proxy_test(config: &Config) -> Result<()> {
    let analyzer = Analyzer::new(config.clone()).context("initializing analyzer")?;
    let pool = analyzer.pool();
    let probe = ProxyProbe::from_config(&config.probe);

    println!("=== Proxy Test ({}) ===\n", probe.echo_url());

    let direct = probe.check(None).await;
    let mut reports = vec![direct];
    if pool.is_empty() {
        println!("No enabled proxies configured; testing direct connection only\n");
    } else {
        reports.extend(pool.test_all(&probe).await);
    }

    for report in &reports {
        match (&report.observed_ip, report.latency_ms) {
            (Some(ip), Some(latency)) if report.success => {
                println!("✓ {:<20} {:<16} {:>8.1} ms", report.name, ip, latency)
            }
            _ => println!(
                "✗ {:<20} {}",
                report.name,
                report.error.as_deref().unwrap_or("unreachable")
            ),
        }
    }

    let working = reports.iter().filter(|r| r.success).count();
    println!("\n{}/{} reachable", working, reports.len());

    Ok(())
}
