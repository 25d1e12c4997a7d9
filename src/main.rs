//! Standalone bridge: streams a synthetic car to the trainer

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use acrl_bridge::{
    Bridge, BridgeConfig, ControlCommand, Driver, RecordTerminator, StreamingClient, SyntheticHost,
};

/// Stream synthetic racing telemetry to a reinforcement-learning trainer.
#[derive(Debug, Parser)]
#[command(name = "acrl-bridge", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "ACRL_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Trainer host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Trainer port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Tick rate in Hz (overrides the config file)
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Terminate every record with a newline
    #[arg(long)]
    newline: bool,

    /// Connect but do not request start
    #[arg(long)]
    no_autostart: bool,

    /// Stop after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Length of the synthetic track in metres
    #[arg(long, default_value_t = 2_000.0)]
    track_length: f32,

    /// Speed of the synthetic car in km/h
    #[arg(long, default_value_t = 120.0)]
    speed: f32,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => BridgeConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate_hz = tick_rate;
        }
        if self.newline {
            config.record_terminator = RecordTerminator::Newline;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Streaming to {} at {}Hz", config.endpoint(), config.tick_rate_hz);

    let sampler = SyntheticHost::new(args.track_length, args.speed);
    let bridge = Bridge::new(sampler, StreamingClient::new(&config));
    let handle = Driver::spawn(bridge, config.tick_interval());

    if !args.no_autostart {
        handle.send(ControlCommand::StartRequested).await?;
    }

    match args.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                result = tokio::signal::ctrl_c() => result.context("waiting for Ctrl-C")?,
            }
        }
        None => tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?,
    }

    let status = handle.shutdown().await?;
    if status.stats.frames_sent == 0 {
        warn!("No frames were sent; is the trainer listening on {}?", config.endpoint());
    }
    info!(
        "Sent {} frames ({} bytes), {} connect failures, {} send failures",
        status.stats.frames_sent,
        status.stats.bytes_sent,
        status.stats.connect_failures,
        status.stats.send_failures
    );
    Ok(())
}
