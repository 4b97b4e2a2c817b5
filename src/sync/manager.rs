//! The hub link: connect, handshake, burst, then the line loop.
//!
//! A [`LinkManager`] owns everything scoped to one connection: the network
//! state rebuilt from the hub's burst and a fresh set of service processors.
//! It is the only writer of that state. The supervisor reaches it through
//! [`LinkCommand`]s only.

use crate::config::Config;
use crate::error::LinkError;
use crate::services::base::PSEUDO_CLIENT_MODES;
use crate::services::{LineContext, ServiceProcessor, ServicesContext, apply_effects, build_processors};
use crate::state::NetworkState;
use crate::sync::handshake::{HandshakeEvent, HandshakeMachine};
use crate::sync::link::{LinkCommand, LinkStatus};
use crate::sync::stream::S2SStream;
use futures_util::{FutureExt, SinkExt, StreamExt};
use slirc_p10::{Message, P10Codec, builder};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

const SHUTDOWN_REASON: &str = "Services shutting down";

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// One connection to the hub and everything that lives as long as it.
pub struct LinkManager {
    ctx: ServicesContext,
    started_at: i64,
    state: NetworkState,
    processors: Vec<Box<dyn ServiceProcessor>>,
    machine: HandshakeMachine,
    status: watch::Sender<LinkStatus>,
}

impl LinkManager {
    pub fn new(
        ctx: ServicesContext,
        started_at: i64,
        status: watch::Sender<LinkStatus>,
    ) -> Result<Self, LinkError> {
        let processors = build_processors(&ctx)?;
        let mut state = NetworkState::new();
        state.add_server(&ctx.config.server.numeric, &ctx.config.server.name);
        let machine = HandshakeMachine::new(&ctx.config.hub.password);
        Ok(Self {
            ctx,
            started_at,
            state,
            processors,
            machine,
            status,
        })
    }

    /// Connect to the configured hub and serve the link until it ends.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<LinkCommand>) -> Result<(), LinkError> {
        self.set_status(LinkStatus::Connecting);
        let stream = S2SStream::connect(&self.ctx.config.hub).await?;
        info!(tls = stream.is_tls(), "Connected to hub");
        self.serve(Framed::new(stream, P10Codec::new()), commands)
            .await
    }

    /// Drive the link over an already-open transport.
    pub async fn serve<S>(
        &mut self,
        mut framed: Framed<S, P10Codec>,
        commands: &mut mpsc::Receiver<LinkCommand>,
    ) -> Result<(), LinkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let now = unix_now();
        let server = &self.ctx.config.server;
        let hello = vec![
            builder::pass(&self.ctx.config.hub.password),
            builder::server(&server.name, &server.numeric, self.started_at, now, &server.description),
        ];
        send_all(&mut framed, hello).await?;
        self.set_status(LinkStatus::HandshakeSent);

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(LinkCommand::Tick) => {
                        let out = self.on_tick();
                        send_all(&mut framed, out).await?;
                    }
                    Some(LinkCommand::Rehash(config)) => self.rehash(config),
                    Some(LinkCommand::Shutdown) | None => {
                        self.set_status(LinkStatus::Closing);
                        let squit = builder::squit(
                            &self.ctx.config.server.numeric,
                            &self.ctx.config.server.name,
                            SHUTDOWN_REASON,
                        );
                        send_all(&mut framed, vec![squit]).await?;
                        framed.close().await?;
                        info!("Link shut down");
                        return Ok(());
                    }
                },
                line = framed.next() => {
                    let discarded = framed.codec_mut().take_discarded();
                    if discarded > 0 {
                        warn!(count = discarded, "Dropped malformed lines from hub");
                    }
                    match line {
                        Some(Ok(msg)) => {
                            let out = self.on_message(msg).await?;
                            send_all(&mut framed, out).await?;
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(LinkError::Closed),
                    }
                }
            }
        }
    }

    fn set_status(&self, next: LinkStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "Link status");
            *current = next;
            true
        });
    }

    /// Handle one inbound line, returning what to send back.
    async fn on_message(&mut self, msg: Message) -> Result<Vec<Message>, LinkError> {
        debug!(line = %msg, "<-");
        crate::metrics::record_line_in();
        let now = unix_now();

        let event = self.machine.on_line(&msg)?;
        let out = match event {
            HandshakeEvent::Ignore => Vec::new(),
            HandshakeEvent::ServerAccepted { hub, name } => {
                info!(hub = %hub, name = %name, "Hub introduced itself, sending burst");
                self.state.add_server(&hub, &name);
                let mut out = self.burst(now);
                out.push(builder::end_of_burst(&self.ctx.config.server.numeric));
                self.machine.burst_sent();
                out
            }
            HandshakeEvent::PeerEndOfBurst => {
                info!(
                    users = self.state.user_count(),
                    channels = self.state.channel_count(),
                    "Hub burst complete"
                );
                vec![builder::eob_ack(&self.ctx.config.server.numeric)]
            }
            HandshakeEvent::BurstAcknowledged => {
                info!(hub = self.machine.hub_name().unwrap_or_default(), "Link established");
                self.activate(now).await
            }
            HandshakeEvent::Line => self.dispatch(&msg, now).await,
        };
        self.set_status(self.machine.status());
        Ok(out)
    }

    /// Introduce every pseudo-client.
    fn burst(&mut self, now: i64) -> Vec<Message> {
        let server = self.ctx.config.server.numeric.clone();
        let mut out = Vec::with_capacity(self.processors.len() + 1);
        for processor in self.processors.iter_mut() {
            out.push(processor.introduce(&server, now));
            let client = processor.client();
            let user = self
                .state
                .introduce_user(&client.numeric, &client.nick, None, &client.host);
            user.ident = client.ident.clone();
            user.apply_modes(PSEUDO_CLIENT_MODES);
        }
        out
    }

    /// Join every pseudo-client to its home channels.
    async fn activate(&mut self, now: i64) -> Vec<Message> {
        let config = Arc::clone(&self.ctx.config);
        let mut out = Vec::new();
        for processor in self.processors.iter_mut() {
            let mut ctx = LineContext {
                config: &config,
                db: &self.ctx.db,
                state: &mut self.state,
                now,
            };
            let effects = processor.activate(&mut ctx).await;
            out.extend(apply_effects(&mut self.state, &config, effects, now));
        }
        out
    }

    /// Route a line to each active service in order, then to the state.
    async fn dispatch(&mut self, msg: &Message, now: i64) -> Vec<Message> {
        let config = Arc::clone(&self.ctx.config);
        let mut out = Vec::new();

        for processor in self.processors.iter_mut() {
            if !processor.client().is_active() {
                continue;
            }
            let name = processor.service_name();
            let mut ctx = LineContext {
                config: &config,
                db: &self.ctx.db,
                state: &mut self.state,
                now,
            };
            let result = AssertUnwindSafe(processor.handle(&mut ctx, msg))
                .catch_unwind()
                .await;
            match result {
                Ok(effects) => out.extend(apply_effects(&mut self.state, &config, effects, now)),
                Err(_) => {
                    error!(service = name, command = %msg.command, "Service panicked handling line");
                    crate::metrics::record_service_panic(name);
                }
            }
        }

        let state = &mut self.state;
        if std::panic::catch_unwind(AssertUnwindSafe(|| state.apply(msg, now))).is_err() {
            error!(command = %msg.command, "State update panicked");
        }

        if msg.is("G") {
            out.push(builder::pong(&config.server.numeric, msg));
        }
        out
    }

    fn on_tick(&mut self) -> Vec<Message> {
        self.state.decay_flood_scores();
        if self.machine.status() != LinkStatus::Linked {
            return Vec::new();
        }
        let now = unix_now();
        let config = Arc::clone(&self.ctx.config);
        let mut out = Vec::new();
        for processor in self.processors.iter_mut() {
            let effects = processor.on_tick(now);
            out.extend(apply_effects(&mut self.state, &config, effects, now));
        }
        out
    }

    fn rehash(&mut self, config: Arc<Config>) {
        for processor in self.processors.iter_mut() {
            processor.rehash(&config);
        }
        self.ctx.config = config;
        info!("Configuration reloaded on live link");
    }
}

async fn send_all<S>(framed: &mut Framed<S, P10Codec>, lines: Vec<Message>) -> Result<(), LinkError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for line in lines {
        debug!(line = %line, "->");
        framed.send(line).await?;
        crate::metrics::record_line_out();
    }
    Ok(())
}

/// Body of a link task: run one link to completion and record how it ended.
pub async fn run_link(
    ctx: ServicesContext,
    started_at: i64,
    mut commands: mpsc::Receiver<LinkCommand>,
    status: watch::Sender<LinkStatus>,
) {
    crate::metrics::record_link_connect();
    let result = match LinkManager::new(ctx, started_at, status.clone()) {
        Ok(mut link) => link.run(&mut commands).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(error = %e, "Link failed");
        crate::metrics::record_link_failure(e.error_code());
        status.send_replace(LinkStatus::Closing);
    }
    status.send_replace(LinkStatus::Closed);
}
