// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request metrics for the admin API.
//!
//! Every request served on either listener is counted by method, matched
//! route and status, and timed by method and route.

use axum::{
	extract::{MatchedPath, Request, State},
	middleware::Next,
	response::Response,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::error;

pub const METRICS_PREFIX: &str = "admin_server";

/// Route label used when no route matched, so unknown paths cannot grow the label set.
const UNMATCHED_ROUTE: &str = "unmatched";

pub struct AdminServerMetrics {
	/// Counter: requests by method, route and status code
	requests_total: IntCounterVec,

	/// Histogram: request latency in seconds by method and route
	request_duration_seconds: HistogramVec,

	registry: Registry,
}

impl AdminServerMetrics {
	/// # Errors
	/// Returns an error if metric registration fails.
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Registry::new();

		let requests_total = IntCounterVec::new(
			Opts::new("requests_total", "Total number of admin API requests")
				.namespace(METRICS_PREFIX),
			&["method", "route", "status"],
		)?;
		registry.register(Box::new(requests_total.clone()))?;

		let request_duration_seconds = HistogramVec::new(
			HistogramOpts::new(
				"request_duration_seconds",
				"Admin API request latency in seconds",
			)
			.namespace(METRICS_PREFIX)
			.buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
			&["method", "route"],
		)?;
		registry.register(Box::new(request_duration_seconds.clone()))?;

		Ok(Self {
			requests_total,
			request_duration_seconds,
			registry,
		})
	}

	pub fn observe(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
		let status = status.to_string();
		self
			.requests_total
			.with_label_values(&[method, route, status.as_str()])
			.inc();
		self
			.request_duration_seconds
			.with_label_values(&[method, route])
			.observe(elapsed.as_secs_f64());
	}

	/// Get Prometheus metrics in text format for export.
	pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
		let metrics = self.registry.gather();
		let encoder = TextEncoder::new();
		let mut buf = Vec::new();
		encoder.encode(&metrics, &mut buf).map_err(|e| {
			error!(error = %e, "failed to encode metrics");
			prometheus::Error::Msg(format!("Failed to encode metrics: {e}"))
		})?;
		Ok(String::from_utf8_lossy(&buf).to_string())
	}
}

/// Middleware recording [`AdminServerMetrics`] for each request.
pub async fn track_metrics(
	State(metrics): State<Arc<AdminServerMetrics>>,
	request: Request,
	next: Next,
) -> Response {
	let started = Instant::now();
	let method = request.method().to_string();
	let route = request
		.extensions()
		.get::<MatchedPath>()
		.map(|path| path.as_str().to_string())
		.unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

	let response = next.run(request).await;

	metrics.observe(&method, &route, response.status().as_u16(), started.elapsed());
	response
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_metrics_creation() {
		assert!(AdminServerMetrics::new().is_ok());
	}

	#[test]
	fn test_observe_is_exported_with_prefix() {
		let metrics = AdminServerMetrics::new().unwrap();
		metrics.observe("POST", "/tokens", 200, Duration::from_millis(3));

		let text = metrics.gather_metrics().unwrap();
		assert!(text.contains("admin_server_requests_total"));
		assert!(text.contains(r#"route="/tokens""#));
		assert!(text.contains(r#"status="200""#));
		assert!(text.contains("admin_server_request_duration_seconds_bucket"));
	}

	#[test]
	fn test_registries_are_independent() {
		let a = AdminServerMetrics::new().unwrap();
		let b = AdminServerMetrics::new().unwrap();
		a.observe("GET", "/metrics", 200, Duration::ZERO);
		assert!(!b.gather_metrics().unwrap().contains(r#"route="/metrics""#));
	}
}
