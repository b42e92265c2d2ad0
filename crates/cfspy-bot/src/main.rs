use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cfspy_core::CfspyConfig;
use cfspy_discord::DiscordAdapter;

/// Used when `RUST_LOG` is unset. One directive per workspace crate.
const DEFAULT_LOG_FILTER: &str = "cfspy=info,cfspy_core=info,cfspy_discord=info,cfspy_widget=info";

/// Codeforces Spy: previews Codeforces links on Discord.
#[derive(Debug, Parser)]
#[command(name = "cfspy", version, about)]
struct Cli {
    /// Config file (default: $CFSPY_CONFIG, then ~/.cfspy/cfspy.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > CFSPY_CONFIG env > ~/.cfspy/cfspy.toml
    let config = CfspyConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        CfspyConfig::default()
    });

    info!("------------ CFSpy starting ------------");

    let shutdown = CancellationToken::new();
    let adapter = DiscordAdapter::new(config, shutdown.clone());
    let mut run = tokio::spawn(adapter.run());

    tokio::select! {
        res = &mut run => res??,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            shutdown.cancel();
            run.await??;
        }
    }

    info!("------------ CFSpy stopped ------------");
    Ok(())
}
