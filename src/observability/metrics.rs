//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_submissions_total` (counter): submissions by outcome
//! - `bridge_polls_total` (counter): poll results by outcome
//! - `bridge_jobs_total` (counter): finished jobs by terminal status
//! - `bridge_job_duration_seconds` (histogram): submit-to-terminal latency
//! - `bridge_progress_updates_total` (counter): partial updates by delivery result
//! - `bridge_pending_tasks` (gauge): staged prompts awaiting a drain
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(outcome: &'static str) {
    counter!("bridge_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_poll(outcome: &'static str) {
    counter!("bridge_polls_total", "outcome" => outcome).increment(1);
}

pub fn record_job(status: &'static str, elapsed: Duration) {
    counter!("bridge_jobs_total", "status" => status).increment(1);
    histogram!("bridge_job_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_progress_update(delivered: bool) {
    let delivered = if delivered { "true" } else { "false" };
    counter!("bridge_progress_updates_total", "delivered" => delivered).increment(1);
}

pub fn record_pending_tasks(count: usize) {
    gauge!("bridge_pending_tasks").set(count as f64);
}
