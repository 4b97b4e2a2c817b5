//! Prometheus metrics collection for slirc-services.
//!
//! Counters only; they are exposed on `/metrics` when a metrics port is
//! configured (see [`crate::http`]). Recording before [`init`] is a no-op.
//!
//! - `services_lines_received_total` / `services_lines_sent_total` - hub traffic
//! - `services_commands_total{service,command}` - commands answered
//! - `services_command_errors_total{service,error}` - commands that failed
//! - `services_abuse_checks_total` - channel lines scanned
//! - `services_incidents_total{kind}` - abuse incidents raised
//! - `services_link_connects_total` / `services_link_reconnects_total`
//! - `services_link_failures_total{error}` - how links ended
//! - `services_service_panics_total{service}` - isolated processor panics

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Link traffic
// ========================================================================

pub static LINES_RECEIVED: OnceLock<IntCounter> = OnceLock::new();

pub static LINES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Link tasks started.
pub static LINK_CONNECTS: OnceLock<IntCounter> = OnceLock::new();

/// Dead links replaced by the supervisor.
pub static LINK_RECONNECTS: OnceLock<IntCounter> = OnceLock::new();

pub static LINK_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Services
// ========================================================================

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by service and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static SERVICE_PANICS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Abuse detection
// ========================================================================

pub static ABUSE_CHECKS: OnceLock<IntCounter> = OnceLock::new();

pub static INCIDENTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called at startup when the metrics endpoint is enabled. Later calls are
/// no-ops.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(register_all);
}

fn register_all() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(LINES_RECEIVED, IntCounter::new("services_lines_received_total", "Lines received from the hub"));
    register!(LINES_SENT, IntCounter::new("services_lines_sent_total", "Lines sent to the hub"));
    register!(LINK_CONNECTS, IntCounter::new("services_link_connects_total", "Link attempts started"));
    register!(LINK_RECONNECTS, IntCounter::new("services_link_reconnects_total", "Dead links replaced"));
    register!(LINK_FAILURES, IntCounterVec::new(Opts::new("services_link_failures_total", "Links ended by an error"), &["error"]));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("services_commands_total", "Service commands processed"), &["service", "command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("services_command_errors_total", "Service command errors"), &["service", "error"]));
    register!(SERVICE_PANICS, IntCounterVec::new(Opts::new("services_service_panics_total", "Panics caught while a service handled a line"), &["service"]));

    register!(ABUSE_CHECKS, IntCounter::new("services_abuse_checks_total", "Channel lines scanned for abuse"));
    register!(INCIDENTS, IntCounterVec::new(Opts::new("services_incidents_total", "Abuse incidents raised"), &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

fn inc(metric: &OnceLock<IntCounter>) {
    if let Some(c) = metric.get() {
        c.inc();
    }
}

fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
pub fn record_line_in() {
    inc(&LINES_RECEIVED);
}

#[inline]
pub fn record_line_out() {
    inc(&LINES_SENT);
}

#[inline]
pub fn record_link_connect() {
    inc(&LINK_CONNECTS);
}

#[inline]
pub fn record_link_reconnect() {
    inc(&LINK_RECONNECTS);
}

#[inline]
pub fn record_link_failure(error: &str) {
    inc_vec(&LINK_FAILURES, &[error]);
}

/// Record a command handled by a service.
#[inline]
pub fn record_command(service: &str, command: &str) {
    inc_vec(&COMMAND_COUNTER, &[service, command]);
}

/// Record a command error.
#[inline]
pub fn record_command_error(service: &str, error: &str) {
    inc_vec(&COMMAND_ERRORS, &[service, error]);
}

#[inline]
pub fn record_service_panic(service: &str) {
    inc_vec(&SERVICE_PANICS, &[service]);
}

#[inline]
pub fn record_abuse_check() {
    inc(&ABUSE_CHECKS);
}

#[inline]
pub fn record_incident(kind: &str) {
    inc_vec(&INCIDENTS, &[kind]);
}
