use crate::config::Config;
use crate::services::base::{PseudoClient, ServiceBase, ServiceState};
use crate::services::{LineContext, ServiceEffect};
use async_trait::async_trait;
use slirc_p10::Message;

/// Trait for pseudo-client services.
///
/// Services see every inbound line while the link is up and produce
/// effects, which the link then applies to state and the wire.
#[async_trait]
pub trait ServiceProcessor: ServiceBase + Send {
    fn client(&self) -> &PseudoClient;

    fn client_mut(&mut self) -> &mut PseudoClient;

    /// Channels this service sits in once the burst is acknowledged, and
    /// whether it holds ops there.
    async fn home_channels(&mut self, ctx: &mut LineContext<'_>) -> (Vec<String>, bool);

    /// Handle one inbound line.
    ///
    /// Only called while the service is active.
    async fn handle(&mut self, ctx: &mut LineContext<'_>, msg: &Message) -> Vec<ServiceEffect>;

    /// Periodic housekeeping, driven by the supervisor tick.
    fn on_tick(&mut self, _now: i64) -> Vec<ServiceEffect> {
        Vec::new()
    }

    /// Pick up a reloaded configuration.
    fn rehash(&mut self, _config: &Config) {}

    /// Produce our introduction during the burst.
    fn introduce(&mut self, server: &str, now: i64) -> Message {
        let client = self.client_mut();
        client.state = ServiceState::RegisteredPendingJoin;
        client.introduction(server, now)
    }

    /// Join home channels and start accepting commands.
    async fn activate(&mut self, ctx: &mut LineContext<'_>) -> Vec<ServiceEffect> {
        if self.client().state != ServiceState::RegisteredPendingJoin {
            return Vec::new();
        }
        let (channels, op) = self.home_channels(ctx).await;
        let numeric = self.client().numeric.clone();
        self.client_mut().state = ServiceState::Active;
        channels
            .into_iter()
            .map(|channel| ServiceEffect::Join {
                numeric: numeric.clone(),
                channel,
                op,
            })
            .collect()
    }
}
