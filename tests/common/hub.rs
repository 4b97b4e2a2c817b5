//! A scripted hub for the services to link to.

use futures_util::{SinkExt, StreamExt};
use slirc_p10::{Message, P10Codec};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

const LINE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FakeHub {
    listener: TcpListener,
}

impl FakeHub {
    pub async fn bind() -> anyhow::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind("127.0.0.1:0").await?,
        })
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Wait for the services to connect.
    pub async fn accept(&self) -> anyhow::Result<HubConn> {
        let (sock, _) = tokio::time::timeout(LINE_TIMEOUT, self.listener.accept()).await??;
        Ok(HubConn {
            framed: Framed::new(sock, P10Codec::new()),
        })
    }
}

/// One accepted link, seen from the hub side.
pub struct HubConn {
    framed: Framed<TcpStream, P10Codec>,
}

impl HubConn {
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        match tokio::time::timeout(LINE_TIMEOUT, self.framed.next()).await? {
            Some(line) => Ok(line?.to_string()),
            None => anyhow::bail!("services closed the link"),
        }
    }

    /// Read lines until one starts with `prefix`, returning it.
    pub async fn recv_until(&mut self, prefix: &str) -> anyhow::Result<String> {
        loop {
            let line = self.recv().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }

    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        let msg: Message = line.parse()?;
        self.framed.send(msg).await?;
        Ok(())
    }

    /// Answer the services' handshake and run both bursts.
    ///
    /// `burst` is sent before the hub's `EB`.
    pub async fn link(&mut self, burst: &[&str]) -> anyhow::Result<Vec<String>> {
        anyhow::ensure!(self.recv().await? == "PASS :linkpass", "expected PASS");
        anyhow::ensure!(self.recv().await?.starts_with("SERVER services.test.net "), "expected SERVER");

        self.send("PASS :linkpass").await?;
        self.send("SERVER hub.test.net 1 1700000000 1700000100 J10 A]]] +h6 :Test hub")
            .await?;

        let mut intros = Vec::new();
        loop {
            let line = self.recv().await?;
            if line == "S EB" {
                break;
            }
            intros.push(line);
        }

        for line in burst {
            self.send(line).await?;
        }
        self.send("A EB").await?;
        anyhow::ensure!(self.recv().await? == "S EA", "expected EA");
        self.send("A EA").await?;
        Ok(intros)
    }
}
