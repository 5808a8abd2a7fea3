//! Prometheus metrics for relay traffic and upstream health.
//!
//! This module provides:
//! - Inbound request counters per route
//! - Upstream call latency and error counts per service
//! - A counter of placeholder frames served to the device

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info};

/// Upstream services the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Service {
    /// Product analytics.
    Mixpanel,
    /// Source hosting.
    Github,
}

// === Metric Name Constants ===

/// Inbound requests counter metric name.
pub const METRIC_REQUESTS: &str = "relay_requests_total";
/// Upstream errors counter metric name.
pub const METRIC_UPSTREAM_ERRORS: &str = "relay_upstream_errors_total";
/// Upstream latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "relay_upstream_latency_ms";
/// Placeholder frames counter metric name.
pub const METRIC_PLACEHOLDER_FRAMES: &str = "relay_placeholder_frames_total";

/// Register metric descriptions.
/// Call this once at startup.
pub fn init_metrics() {
    describe_counter!(METRIC_REQUESTS, "Total number of inbound HTTP requests");
    describe_counter!(
        METRIC_UPSTREAM_ERRORS,
        "Total number of failed upstream calls"
    );
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream call latency in milliseconds"
    );
    describe_counter!(
        METRIC_PLACEHOLDER_FRAMES,
        "Total number of frames served with a placeholder value"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter on its own listener.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

/// Increment the inbound request counter.
pub fn inc_requests(route: &'static str) {
    counter!(METRIC_REQUESTS, "route" => route).increment(1);
}

/// Increment the upstream error counter.
pub fn inc_upstream_errors(service: Service) {
    let service: &'static str = service.into();
    counter!(METRIC_UPSTREAM_ERRORS, "service" => service).increment(1);
}

/// Add to the placeholder frame counter.
pub fn add_placeholder_frames(count: u64) {
    if count > 0 {
        counter!(METRIC_PLACEHOLDER_FRAMES).increment(count);
    }
}

/// RAII guard for timing an upstream call.
/// Records latency when dropped.
pub struct UpstreamTimer {
    start: Instant,
    service: Service,
}

impl UpstreamTimer {
    /// Start timing a call to `service`.
    pub fn new(service: Service) -> Self {
        Self {
            start: Instant::now(),
            service,
        }
    }

    /// Elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for UpstreamTimer {
    fn drop(&mut self) {
        let service: &'static str = self.service.into();
        histogram!(METRIC_UPSTREAM_LATENCY, "service" => service).record(self.elapsed_ms());
    }
}
