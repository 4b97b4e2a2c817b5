//! Reconnection supervisor.
//!
//! Ticks every two seconds. A missing or dead link is replaced; a live one
//! is sent [`LinkCommand::Tick`](crate::sync::LinkCommand::Tick) so it can
//! decay scores and expire bans inside its own loop.

use crate::config::Config;
use crate::services::ServicesContext;
use crate::sync::link::{LinkHandle, LinkStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// How long a closing link may take to send `SQ` before it is aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct Inner {
    ctx: Mutex<ServicesContext>,
    link: Mutex<Option<LinkHandle>>,
    started_at: i64,
}

#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    pub fn new(ctx: ServicesContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx: Mutex::new(ctx),
                link: Mutex::new(None),
                started_at: chrono::Utc::now().timestamp(),
            }),
        }
    }

    /// Status of the current link, `None` before the first tick.
    pub fn link_status(&self) -> Option<LinkStatus> {
        self.inner.link.lock().as_ref().map(LinkHandle::status)
    }

    /// One supervisor pass.
    pub fn tick(&self) {
        let mut link = self.inner.link.lock();
        if let Some(handle) = link.as_ref().filter(|h| !h.is_dead()) {
            handle.tick();
            return;
        }
        if let Some(old) = link.take() {
            info!(status = %old.status(), "Link is down, reconnecting");
            old.abort();
            crate::metrics::record_link_reconnect();
        }
        let ctx = self.inner.ctx.lock().clone();
        *link = Some(LinkHandle::spawn(ctx, self.inner.started_at));
    }

    /// Use a reloaded configuration for the live link and every later one.
    pub fn rehash(&self, config: Arc<Config>) {
        self.inner.ctx.lock().config = Arc::clone(&config);
        if let Some(handle) = self.inner.link.lock().as_ref() {
            handle.rehash(config);
        }
    }

    /// Close the current link, if any.
    pub async fn shutdown(&self, grace: Duration) {
        let handle = self.inner.link.lock().take();
        if let Some(handle) = handle {
            handle.shutdown(grace).await;
        }
    }

    /// Tick until `stop` flips to true, then shut the link down.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Supervisor stopping");
        self.shutdown(SHUTDOWN_GRACE).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::security::HomoglyphSet;
    use crate::services::test_support;
    use futures_util::{SinkExt, StreamExt};
    use slirc_p10::{Message, P10Codec};
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    async fn supervisor_for(port: u16) -> Supervisor {
        let mut config = test_support::config();
        config.hub.port = port;
        Supervisor::new(ServicesContext {
            config: Arc::new(config),
            db: Database::new(":memory:").await.unwrap(),
            homoglyphs: Arc::new(HomoglyphSet::parse("")),
        })
    }

    async fn accept(listener: &TcpListener) -> Framed<tokio::net::TcpStream, P10Codec> {
        let (sock, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        Framed::new(sock, P10Codec::new())
    }

    async fn wait_for(sup: &Supervisor, status: LinkStatus) {
        for _ in 0..100 {
            if sup.link_status() == Some(status) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("link never reached {status}");
    }

    #[tokio::test]
    async fn reconnects_after_hub_drops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sup = supervisor_for(port).await;
        assert_eq!(sup.link_status(), None);

        sup.tick();
        let mut hub = accept(&listener).await;
        let pass = hub.next().await.unwrap().unwrap();
        assert!(pass.is("PASS"));
        drop(hub);
        wait_for(&sup, LinkStatus::Closed).await;

        sup.tick();
        let mut hub = accept(&listener).await;
        assert!(hub.next().await.unwrap().unwrap().is("PASS"));
        hub.send("ERROR :go away".parse::<Message>().unwrap())
            .await
            .unwrap();
        wait_for(&sup, LinkStatus::Closed).await;
    }

    #[tokio::test]
    async fn failed_connect_is_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sup = supervisor_for(port).await;
        sup.tick();
        wait_for(&sup, LinkStatus::Closed).await;

        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        sup.tick();
        let mut hub = accept(&listener).await;
        assert!(hub.next().await.unwrap().unwrap().is("PASS"));
        sup.shutdown(Duration::from_millis(200)).await;
        assert_eq!(sup.link_status(), None);
    }
}
