// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whether the dataplane token endpoint is served.
//!
//! The endpoint is served only when enabled in configuration. A global control
//! plane always serves it. Standalone and remote control planes serve it on
//! universal only, since Kubernetes dataplanes get their identity elsewhere.

use meshtrust_server_config::{Environment, MeshtrustConfig, Mode};
use meshtrust_tokens::{DataplaneTokenIssuer, SigningKeySource};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEndpointExposure {
	Enabled,
	DisabledByConfig,
	DisabledByEnvironment,
}

impl TokenEndpointExposure {
	pub fn decide(enabled: bool, mode: Mode, environment: Environment) -> Self {
		if !enabled {
			return Self::DisabledByConfig;
		}
		match (mode, environment) {
			(Mode::Global, _) => Self::Enabled,
			(Mode::Standalone | Mode::Remote, Environment::Universal) => Self::Enabled,
			(Mode::Standalone | Mode::Remote, Environment::Kubernetes) => Self::DisabledByEnvironment,
		}
	}

	pub fn from_config(config: &MeshtrustConfig) -> Self {
		Self::decide(
			config.admin_server.dataplane_token.enabled,
			config.control_plane.mode,
			config.control_plane.environment,
		)
	}

	pub fn is_enabled(self) -> bool {
		self == Self::Enabled
	}
}

/// The issuer to mount, or `None` when the endpoint is not exposed.
pub fn dataplane_token_issuer(
	config: &MeshtrustConfig,
	signing_key_source: Arc<dyn SigningKeySource>,
) -> Option<DataplaneTokenIssuer> {
	match TokenEndpointExposure::from_config(config) {
		TokenEndpointExposure::Enabled => Some(DataplaneTokenIssuer::from_shared(signing_key_source)),
		TokenEndpointExposure::DisabledByConfig => {
			info!("Dataplane Token Webservice is disabled. Dataplane Tokens won't be verified.");
			None
		}
		TokenEndpointExposure::DisabledByEnvironment => {
			info!(
				mode = %config.control_plane.mode,
				environment = %config.control_plane.environment,
				"Dataplane Token Webservice is not served in this mode and environment"
			);
			None
		}
	}
}
