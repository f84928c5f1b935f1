//! CNI Preflight
//!
//! Detects the target cluster's flavor and validates installer configuration
//! before a CNI install, or detects the flavor for an uninstall.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cni_preflight::{
    AzCliByocniLookup, DatapathMode, Error, KubeFlavorDetector, Overrides, Preflight,
    PreflightConfig, ProxyReplacement, Result, RunGuard, TokioCommandRunner,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// CNI Preflight - cluster autodetection and pre-install validation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// YAML file with install parameters; flags take precedence
    #[arg(long, global = true, env = "PREFLIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// kubeconfig context to use
    #[arg(long, global = true, env = "KUBE_CONTEXT")]
    context: Option<String>,

    /// Overall deadline in seconds
    #[arg(long, global = true, env = "PREFLIGHT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect, validate and resolve install parameters
    Install(InstallArgs),
    /// Detect the cluster flavor only
    Uninstall,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    /// Skip a validation check by name (repeatable)
    #[arg(long = "disable-check", value_name = "NAME")]
    disable_checks: Vec<String>,

    /// Datapath mode (tunnel, native, aws-eni, gke, azure, aks-byocni)
    #[arg(long)]
    datapath_mode: Option<DatapathMode>,

    /// Kube-proxy replacement (disabled, partial, strict, true, false)
    #[arg(long)]
    kube_proxy_replacement: Option<ProxyReplacement>,

    /// Cluster name
    #[arg(long)]
    cluster_name: Option<String>,

    /// Encryption mode (disabled, ipsec, wireguard)
    #[arg(long)]
    encryption: Option<String>,

    /// IPAM mode (deprecated)
    #[arg(long, hide = true)]
    ipam: Option<String>,

    /// Azure resource group of the AKS cluster
    #[arg(long, env = "AZURE_RESOURCE_GROUP")]
    azure_resource_group: Option<String>,

    /// Azure subscription of the AKS cluster
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    azure_subscription_id: Option<String>,

    /// AKS resource name, when it differs from the detected cluster name
    #[arg(long, env = "AZURE_CLUSTER_NAME")]
    azure_cluster_name: Option<String>,

    /// Chart version that will be installed
    #[arg(long)]
    chart_version: Option<String>,

    /// Format of the resolved parameters
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let mut config = match &args.config {
        Some(path) => PreflightConfig::load(path).map_err(report)?,
        None => PreflightConfig::default(),
    };
    let install = match &args.command {
        Command::Install(install) => Some(install),
        Command::Uninstall => None,
    };
    config.apply(overrides(&args, install));

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling preflight");
            ctrl_c.cancel();
        }
    });

    let runner = Arc::new(TokioCommandRunner::new());
    let detector = KubeFlavorDetector::from_kubeconfig(config.context.clone()).await?;
    let mut preflight = Preflight::new(
        Arc::new(detector),
        Arc::new(AzCliByocniLookup::new(runner.clone())),
        runner,
        config.params.clone(),
    )
    .with_guard(RunGuard::with_timeout(token, config.timeout()));

    match install {
        Some(install) => {
            let outcome = preflight.autodetect_and_validate().await.map_err(report)?;
            info!("✅ Preflight passed");

            let rendered = match install.output {
                OutputFormat::Yaml => serde_yaml::to_string(&outcome)?,
                OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
            };
            println!("{}", rendered);
        }
        None => {
            let flavor = preflight.autodetect().await.map_err(report)?;
            println!("{}", flavor.kind);
        }
    }

    Ok(())
}

fn overrides(args: &Args, install: Option<&InstallArgs>) -> Overrides {
    let mut overrides = Overrides {
        context: args.context.clone(),
        timeout_secs: args.timeout_secs,
        ..Default::default()
    };

    if let Some(install) = install {
        overrides.disable_checks = install.disable_checks.clone();
        overrides.datapath_mode = install.datapath_mode;
        overrides.kube_proxy_replacement = install.kube_proxy_replacement;
        overrides.cluster_name = install.cluster_name.clone();
        overrides.encryption = install.encryption.clone();
        overrides.ipam = install.ipam.clone();
        overrides.azure_resource_group = install.azure_resource_group.clone();
        overrides.azure_subscription_id = install.azure_subscription_id.clone();
        overrides.azure_cluster_name = install.azure_cluster_name.clone();
        overrides.chart_version = install.chart_version.clone();
    }

    overrides
}

fn report(err: Error) -> Error {
    if err.is_cancellation() {
        warn!("Preflight aborted: {}", err);
    } else if err.is_user_error() {
        error!("Invalid install parameters: {}", err);
    } else {
        error!("Preflight failed: {}", err);
    }
    err
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["kube=warn", "hyper=warn", "tower=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
