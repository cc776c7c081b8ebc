// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of the admin API router shared by both listeners.

use axum::{middleware, Router};
use meshtrust_server_config::MeshtrustConfig;
use meshtrust_tokens::DataplaneTokenIssuer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AdminServerError;
use crate::exposure::dataplane_token_issuer;
use crate::metrics::{track_metrics, AdminServerMetrics};
use crate::routes;
use crate::signing_key::signing_key_source;
use crate::store::SecretStore;

pub struct AdminApi {
	store: Arc<dyn SecretStore>,
	metrics: Arc<AdminServerMetrics>,
	read_only: bool,
	token_issuer: Option<DataplaneTokenIssuer>,
}

impl AdminApi {
	pub fn new(store: Arc<dyn SecretStore>, metrics: Arc<AdminServerMetrics>) -> Self {
		Self {
			store,
			metrics,
			read_only: false,
			token_issuer: None,
		}
	}

	/// Leaves out the secret create, update and delete routes.
	pub fn read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	/// Mounts the token routes when `issuer` is set.
	pub fn with_token_issuer(mut self, issuer: Option<DataplaneTokenIssuer>) -> Self {
		self.token_issuer = issuer;
		self
	}

	pub fn serves_tokens(&self) -> bool {
		self.token_issuer.is_some()
	}

	pub fn router(self) -> Router {
		if self.read_only {
			info!("control plane is read-only; secret modification endpoints are not registered");
		}

		let mut router = Router::new()
			.merge(routes::secrets::router(self.store, self.read_only))
			.merge(routes::metrics::router(self.metrics.clone()));

		if let Some(issuer) = self.token_issuer {
			router = router.merge(routes::tokens::router(issuer));
		}

		router
			.layer(middleware::from_fn_with_state(self.metrics, track_metrics))
			.layer(TraceLayer::new_for_http())
	}
}

/// Builds the admin API from configuration.
///
/// Prepares the signing key source (bootstrapping the stored key when
/// configured) and applies the token endpoint exposure policy.
pub fn setup_api(
	config: &MeshtrustConfig,
	store: Arc<dyn SecretStore>,
) -> Result<AdminApi, AdminServerError> {
	let metrics = Arc::new(AdminServerMetrics::new()?);
	let key_source = signing_key_source(&config.signing_key, store.clone())?;
	let issuer = dataplane_token_issuer(config, key_source);

	Ok(AdminApi::new(store, metrics)
		.read_only(config.control_plane.read_only)
		.with_token_issuer(issuer))
}
