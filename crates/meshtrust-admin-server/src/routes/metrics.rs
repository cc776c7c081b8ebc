// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
	routing::get,
	Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::AdminServerMetrics;

pub fn router(metrics: Arc<AdminServerMetrics>) -> Router {
	Router::new()
		.route("/metrics", get(prometheus_metrics))
		.with_state(metrics)
}

/// GET /metrics - Prometheus metrics export endpoint.
pub async fn prometheus_metrics(
	State(metrics): State<Arc<AdminServerMetrics>>,
) -> Result<impl IntoResponse, ApiError> {
	match metrics.gather_metrics() {
		Ok(text) => Ok((
			StatusCode::OK,
			[(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
			text,
		)),
		Err(e) => Err(ApiError::Internal(format!("Failed to gather metrics: {e}"))),
	}
}
