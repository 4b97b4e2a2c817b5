use crate::config::Config;
use crate::services::ServicesContext;
use crate::sync::manager;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

/// Control-channel depth. Ticks are dropped, not queued, when it fills.
const COMMAND_QUEUE: usize = 32;

/// Lifecycle of one hub link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    Connecting,
    /// PASS and SERVER sent.
    HandshakeSent,
    /// Hub's SERVER received; our burst is going out.
    AwaitingServerAck,
    /// Our `EB` sent, waiting for the hub's `EA`.
    Bursting,
    Linked,
    Closing,
    Closed,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::HandshakeSent => "handshake_sent",
            Self::AwaitingServerAck => "awaiting_server_ack",
            Self::Bursting => "bursting",
            Self::Linked => "linked",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages from the supervisor to the link task.
#[derive(Debug)]
pub enum LinkCommand {
    /// Decay abuse scores and expire timed bans.
    Tick,
    /// Swap in a reloaded configuration.
    Rehash(Arc<Config>),
    /// Send `SQ` and close.
    Shutdown,
}

/// The supervisor's view of a running link.
pub struct LinkHandle {
    commands: mpsc::Sender<LinkCommand>,
    status: watch::Receiver<LinkStatus>,
    task: JoinHandle<()>,
}

impl LinkHandle {
    /// Start a new link task.
    pub fn spawn(ctx: ServicesContext, started_at: i64) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE);
        let (status_tx, status) = watch::channel(LinkStatus::Idle);
        let span = info_span!("link", hub = %ctx.config.hub.address());
        let task = tokio::spawn(manager::run_link(ctx, started_at, rx, status_tx).instrument(span));
        Self {
            commands,
            status,
            task,
        }
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Whether the link has ended and should be replaced.
    pub fn is_dead(&self) -> bool {
        self.status() == LinkStatus::Closed || self.task.is_finished()
    }

    pub fn tick(&self) {
        if let Err(e) = self.commands.try_send(LinkCommand::Tick) {
            debug!(error = %e, "Tick not delivered to link");
        }
    }

    pub fn rehash(&self, config: Arc<Config>) {
        if let Err(e) = self.commands.try_send(LinkCommand::Rehash(config)) {
            warn!(error = %e, "Rehash not delivered to link");
        }
    }

    /// Ask the link to close, aborting it if it has not finished within `grace`.
    pub async fn shutdown(self, grace: Duration) {
        let mut task = self.task;
        if self.commands.try_send(LinkCommand::Shutdown).is_err() {
            task.abort();
            return;
        }
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            warn!(grace_ms = grace.as_millis() as u64, "Link did not close in time, aborting");
            task.abort();
        }
    }

    /// Drop the task without ceremony.
    pub fn abort(&self) {
        self.task.abort();
    }
}
