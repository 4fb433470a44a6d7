//! ams-daemon - Ability Lifecycle Manager Daemon
//!
//! Binary entry point: parses arguments, assembles the manager from its
//! collaborators (bundle registry, admission policy, launcher, application
//! runtime factory), binds the IPC socket, and runs until a termination
//! signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use ams_core::bundle::{AdmissionPolicy, AllowAll, DenyList, StaticBundleRegistry};
use ams_core::config::AmsConfig;
use ams_core::service::AbilityService;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ams_daemon::launcher::HeadlessLauncher;
use ams_daemon::runtime::HeadlessRuntimeFactory;
use ams_daemon::server::{cleanup_socket, IpcServer};

/// ams daemon - ability lifecycle manager
#[derive(Parser, Debug)]
#[command(name = "ams-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the manager Unix socket
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Bundle name of the resident launcher
    #[arg(long)]
    launcher_bundle: Option<String>,

    /// Path to a JSON bundle table ({"bundle.name": "/launch/path", ...})
    #[arg(long)]
    bundles: Option<PathBuf>,

    /// Register a single bundle as name=path (repeatable)
    #[arg(long = "bundle", value_name = "NAME=PATH")]
    bundle: Vec<String>,

    /// Deny a bundle from ever taking the foreground (repeatable)
    #[arg(long)]
    deny: Vec<String>,

    /// Clear the launcher's launch payload once it first backgrounds
    #[arg(long)]
    clean_ability_data: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn build_registry(args: &Args) -> Result<StaticBundleRegistry> {
    let mut registry = if let Some(path) = &args.bundles {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bundle table {}", path.display()))?;
        StaticBundleRegistry::from_json(&json)
            .with_context(|| format!("invalid bundle table {}", path.display()))?
    } else {
        StaticBundleRegistry::new()
    };

    for entry in &args.bundle {
        let (name, path) = entry
            .split_once('=')
            .with_context(|| format!("--bundle '{entry}' is not NAME=PATH"))?;
        registry.insert(name, path);
    }
    Ok(registry)
}

fn build_config(args: &Args) -> AmsConfig {
    let mut config = AmsConfig::default();
    if let Some(socket) = &args.socket {
        config.socket_path.clone_from(socket);
    }
    if let Some(launcher) = &args.launcher_bundle {
        config.launcher_bundle.clone_from(launcher);
    }
    config.clean_ability_data = args.clean_ability_data;
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = build_config(&args);
    let registry = build_registry(&args)?;
    let admission: Arc<dyn AdmissionPolicy> = if args.deny.is_empty() {
        Arc::new(AllowAll)
    } else {
        Arc::new(DenyList::new(args.deny.clone()))
    };

    let socket_path = config.socket_path.clone();
    let (service, manager) = AbilityService::new(
        config,
        Arc::new(registry),
        admission,
        Box::new(HeadlessLauncher::new()),
        Arc::new(HeadlessRuntimeFactory),
    );
    tokio::spawn(service.run());

    let server = IpcServer::bind(&socket_path, manager)
        .with_context(|| format!("failed to bind {}", socket_path.display()))?;
    info!(
        pid = std::process::id(),
        socket = %socket_path.display(),
        "ams daemon started"
    );

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT")?;
    tokio::select! {
        () = server.run() => {},
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        _ = sigint.recv() => info!("SIGINT received, shutting down"),
    }

    cleanup_socket(&socket_path);
    info!("ams daemon stopped");
    Ok(())
}
