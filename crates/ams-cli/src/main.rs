//! ams - Ability Lifecycle Manager CLI
//!
//! Thin client over the manager socket. Every subcommand is one request;
//! rejections surface the manager's status code.

use std::path::PathBuf;
use std::time::Duration;

use ams_core::client::{AmsClient, DiscoveryConfig};
use ams_core::config::DEFAULT_SOCKET_PATH;
use ams_core::record::LifecycleState;
use ams_core::want::{ElementName, Want};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// ams - ability lifecycle manager client
#[derive(Parser, Debug)]
#[command(name = "ams")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the manager Unix socket
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Connection attempts before giving up on discovery
    #[arg(long, default_value_t = 10)]
    retries: u32,

    /// Milliseconds between discovery attempts
    #[arg(long, default_value_t = 200)]
    retry_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an ability
    Start {
        /// Target bundle name
        bundle: String,

        /// Ability name within the bundle
        #[arg(long, default_value = "")]
        ability: String,

        /// Opaque payload handed to the ability at launch
        #[arg(long)]
        data: Option<String>,
    },

    /// Gracefully terminate the ability holding a token
    Terminate {
        /// Identity token
        token: u16,
    },

    /// Force-stop the application holding a token
    ForceStop {
        /// Identity token
        token: u16,
    },

    /// Force-stop the application owning a bundle name
    ForceStopBundle {
        /// Bundle name
        bundle: String,
    },

    /// Print the current foreground ability
    Top,

    /// Report a lifecycle completion on behalf of a token
    Done {
        /// Identity token (only the low byte travels on the wire)
        token: u16,

        /// Confirmed state (stopped, inactive, active, background)
        state: String,
    },
}

fn parse_state(state: &str) -> Result<LifecycleState> {
    match state {
        "stopped" => Ok(LifecycleState::Uninitialized),
        "initial" => Ok(LifecycleState::Initial),
        "inactive" => Ok(LifecycleState::Inactive),
        "active" => Ok(LifecycleState::Active),
        "background" => Ok(LifecycleState::Background),
        other => bail!("unknown lifecycle state '{other}'"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let discovery = DiscoveryConfig {
        socket_path: cli.socket.clone(),
        retries: cli.retries,
        retry_interval: Duration::from_millis(cli.retry_interval_ms),
    };
    let mut client = AmsClient::connect(&discovery)
        .await
        .context("manager not reachable")?;

    match cli.command {
        Commands::Start {
            bundle,
            ability,
            data,
        } => {
            let mut want = Want::new(ElementName::new(bundle, ability));
            if let Some(data) = data {
                want = want.with_data(data.into_bytes());
            }
            client.start_ability(&want).await?;
            println!("ok");
        },
        Commands::Terminate { token } => {
            client.terminate_ability(token).await?;
            println!("ok");
        },
        Commands::ForceStop { token } => {
            client.force_stop_app(token).await?;
            println!("ok");
        },
        Commands::ForceStopBundle { bundle } => {
            client.force_stop_bundle(&bundle).await?;
            println!("ok");
        },
        Commands::Top => match client.get_top_ability().await? {
            Some(element) => println!("{element}"),
            None => println!("(none)"),
        },
        Commands::Done { token, state } => {
            let state = parse_state(&state)?;
            client.lifecycle_done(token, state).await?;
            println!("ok");
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_state_names() {
        assert_eq!(parse_state("active").unwrap(), LifecycleState::Active);
        assert_eq!(
            parse_state("stopped").unwrap(),
            LifecycleState::Uninitialized
        );
        assert!(parse_state("zombie").is_err());
    }
}
