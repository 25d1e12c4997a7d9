//! Driver runs a bridge on a fixed tick, standing in for the host's frame callback

use futures::Stream;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, BridgeStatus, ControlCommand, HostCommandSink};
use crate::sampler::Sampler;
use crate::{BridgeError, Result};

/// Depth of the command queue between the host UI and the tick loop.
const COMMAND_QUEUE_DEPTH: usize = 16;

/// Shortest tick interval the loop will run at.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Handles for talking to a running driver
pub struct DriverHandle {
    commands: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<BridgeStatus>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Queue a command for the tick loop.
    pub async fn send(&self, command: ControlCommand) -> Result<()> {
        self.commands.send(command).await.map_err(|_| BridgeError::Shutdown)
    }

    /// Latest published status.
    pub fn status(&self) -> BridgeStatus {
        *self.status.borrow()
    }

    /// Status changes as a stream, starting with the current status.
    pub fn status_updates(&self) -> impl Stream<Item = BridgeStatus> + use<> {
        WatchStream::new(self.status.clone())
    }

    /// Token that stops the driver when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the tick loop, shut the bridge down and wait for the task to finish.
    pub async fn shutdown(self) -> Result<BridgeStatus> {
        self.cancel.cancel();
        self.task.await.map_err(|e| BridgeError::Driver { reason: e.to_string() })?;
        Ok(*self.status.borrow())
    }
}

/// Driver spawns the tick loop that owns the bridge
///
/// Ticks and commands are serialized in one task, so the bridge is never
/// touched concurrently. A reconnect inside a tick blocks the task for up to
/// the connect timeout, exactly as it would stall a host frame callback.
pub struct Driver;

impl Driver {
    /// Spawn the tick loop for `bridge`, ticking every `tick_interval`.
    ///
    /// Intervals shorter than one millisecond (including zero) are raised to
    /// one millisecond.
    pub fn spawn<S, C>(bridge: Bridge<S, C>, tick_interval: Duration) -> DriverHandle
    where
        S: Sampler + Send + 'static,
        C: HostCommandSink + Send + 'static,
    {
        let tick_interval = if tick_interval < MIN_TICK_INTERVAL {
            warn!("Tick interval {:?} is too short, using {:?}", tick_interval, MIN_TICK_INTERVAL);
            MIN_TICK_INTERVAL
        } else {
            tick_interval
        };

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (status_tx, status_rx) = watch::channel(bridge.status());
        let cancel = CancellationToken::new();

        let cancel_loop = cancel.clone();
        let task = tokio::spawn(async move {
            Self::tick_loop(bridge, tick_interval, command_rx, status_tx, cancel_loop).await;
        });

        DriverHandle { commands: command_tx, status: status_rx, cancel, task }
    }

    async fn tick_loop<S, C>(
        mut bridge: Bridge<S, C>,
        tick_interval: Duration,
        mut commands: mpsc::Receiver<ControlCommand>,
        status_tx: watch::Sender<BridgeStatus>,
        cancel: CancellationToken,
    ) where
        S: Sampler,
        C: HostCommandSink,
    {
        info!("Tick loop started ({:?} per tick)", tick_interval);
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();
        let mut failed_ticks = 0u64;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("Tick loop cancelled");
                    break;
                }
                Some(command) = commands.recv() => {
                    bridge.handle(command);
                }
                now = ticker.tick() => {
                    let delta = now.duration_since(last_tick);
                    last_tick = now;

                    let outcome = bridge.update(delta);
                    if outcome.is_failure() {
                        failed_ticks += 1;
                        warn!("Tick {} failed: {:?}", bridge.updates(), outcome);
                    }
                }
            }

            publish(&status_tx, bridge.status());
        }

        bridge.shutdown();
        publish(&status_tx, bridge.status());
        info!(
            "Tick loop ended after {} ticks ({} failed)",
            bridge.updates(),
            failed_ticks
        );
    }
}

fn publish(status_tx: &watch::Sender<BridgeStatus>, status: BridgeStatus) {
    status_tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            *current = status;
            true
        }
    });
}
