//! Host wiring: sampler + streaming client behind a command interface
//!
//! The host's UI is an external collaborator. It forwards button presses as
//! [`ControlCommand`]s (or calls [`Bridge::on_start_requested`] /
//! [`Bridge::on_stop_requested`] directly), calls [`Bridge::update`] once per
//! frame, and renders [`BridgeStatus`], which reflects only the training flag.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::client::StreamingClient;
use crate::sampler::Sampler;
use crate::types::{ClientState, ClientStats, TickOutcome};

/// Requests the host UI can make of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    StartRequested,
    StopRequested,
    RespawnRequested,
}

/// Numeric opcodes the simulator accepts from the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Restart back to the session menu
    RestartSession,

    /// Start the lap and hand control to the driver
    StartDriving,
}

impl HostCommand {
    pub fn opcode(self) -> u32 {
        match self {
            HostCommand::RestartSession => 68,
            HostCommand::StartDriving => 69,
        }
    }
}

/// Outbound command channel to the simulator.
pub trait HostCommandSink {
    fn send_command(&mut self, command: HostCommand);
}

/// Sink for hosts without a command channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommandSink;

impl HostCommandSink for NoopCommandSink {
    fn send_command(&mut self, command: HostCommand) {
        debug!("No host command channel, dropping opcode {}", command.opcode());
    }
}

impl HostCommandSink for Vec<HostCommand> {
    fn send_command(&mut self, command: HostCommand) {
        self.push(command);
    }
}

/// What the host UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub training: bool,
    pub state: ClientState,
    pub stats: ClientStats,
}

impl BridgeStatus {
    /// Status label text, e.g. `Training: True`.
    pub fn label(&self) -> String {
        format!("Training: {}", if self.training { "True" } else { "False" })
    }

    /// The start button is offered whenever training is off.
    pub fn start_visible(&self) -> bool {
        !self.training
    }

    /// The stop button is offered only while training.
    pub fn stop_visible(&self) -> bool {
        self.training
    }
}

/// One sampler and one streaming client, driven by the host.
pub struct Bridge<S, C = NoopCommandSink> {
    sampler: S,
    client: StreamingClient,
    commands: C,
    updates: u64,
}

impl<S: Sampler> Bridge<S, NoopCommandSink> {
    /// Wire a sampler to a client and make the initial connection attempt.
    ///
    /// The attempt blocks for at most the client's connect timeout; failing it
    /// is not an error, the operator can press start once the trainer is up.
    pub fn new(sampler: S, client: StreamingClient) -> Self {
        Self::with_command_sink(sampler, client, NoopCommandSink)
    }
}

impl<S: Sampler, C: HostCommandSink> Bridge<S, C> {
    /// Like [`Bridge::new`], with a channel for host commands.
    pub fn with_command_sink(sampler: S, mut client: StreamingClient, commands: C) -> Self {
        info!("Initializing bridge to {}", client.endpoint());
        client.connect();
        Self { sampler, client, commands, updates: 0 }
    }

    /// Start button pressed.
    pub fn on_start_requested(&mut self) -> bool {
        self.client.start()
    }

    /// Stop button pressed.
    pub fn on_stop_requested(&mut self) {
        self.client.stop();
    }

    /// Dispatch a command from the host UI.
    pub fn handle(&mut self, command: ControlCommand) {
        debug!("Handling {:?}", command);
        match command {
            ControlCommand::StartRequested => {
                self.on_start_requested();
            }
            ControlCommand::StopRequested => self.on_stop_requested(),
            ControlCommand::RespawnRequested => self.respawn(),
        }
    }

    /// Per-frame callback. Samples and streams only while training.
    pub fn update(&mut self, delta: Duration) -> TickOutcome {
        self.updates += 1;

        if !self.client.is_training() {
            return TickOutcome::Skipped;
        }

        trace!("Update {} (dt={:?})", self.updates, delta);
        let frame = self.sampler.sample();
        self.client.tick(&frame)
    }

    /// Put the car back on the start line: restart the session, then start driving.
    pub fn respawn(&mut self) {
        info!("Respawning");
        self.commands.send_command(HostCommand::RestartSession);
        self.commands.send_command(HostCommand::StartDriving);
    }

    /// Stop streaming and close the connection.
    pub fn shutdown(&mut self) {
        self.client.shutdown();
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            training: self.client.is_training(),
            state: self.client.state(),
            stats: self.client.stats(),
        }
    }

    pub fn client(&self) -> &StreamingClient {
        &self.client
    }

    pub fn commands(&self) -> &C {
        &self.commands
    }

    /// Number of `update` calls so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
