//! `/metrics` endpoint for Prometheus scraping.
//!
//! Binding is split from serving so startup can fail loudly on a taken port
//! while the server itself runs as a background task.

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

fn router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// A bound but not yet serving metrics endpoint.
pub struct MetricsServer {
    listener: TcpListener,
}

impl MetricsServer {
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process exits.
    pub async fn serve(self) {
        let addr = self.local_addr().ok();
        info!(addr = ?addr, "Metrics endpoint listening");
        if let Err(e) = axum::serve(self.listener, router()).await {
            error!(addr = ?addr, error = %e, "Metrics endpoint failed");
        }
    }
}
