// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the meshtrust admin server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`MESHTRUST_*`)
//!
//! # Usage
//!
//! ```ignore
//! use meshtrust_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Loopback admin port {}", config.admin_server.local.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::MeshtrustConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshtrustConfig {
	pub admin_server: AdminServerConfig,
	pub control_plane: ControlPlaneConfig,
	pub signing_key: SigningKeyConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`MESHTRUST_*`)
/// 2. Config file (`/etc/meshtrust/admin-server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<MeshtrustConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<MeshtrustConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Merge `sources` in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<MeshtrustConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = MeshtrustConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: MeshtrustConfigLayer) -> Result<MeshtrustConfig, ConfigError> {
	let admin_server = layer.admin_server.unwrap_or_default().finalize();
	let control_plane = layer.control_plane.unwrap_or_default().finalize();
	let signing_key = layer.signing_key.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&admin_server)?;

	info!(
		local_port = admin_server.local.port,
		public_enabled = admin_server.public.enabled,
		public_interface = %admin_server.public.interface,
		public_port = admin_server.public.port,
		dataplane_token_enabled = admin_server.dataplane_token.enabled,
		mode = %control_plane.mode,
		environment = %control_plane.environment,
		read_only = control_plane.read_only,
		signing_key_file = signing_key.file.is_some(),
		"Admin server configuration loaded"
	);

	Ok(MeshtrustConfig {
		admin_server,
		control_plane,
		signing_key,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(admin_server: &AdminServerConfig) -> Result<(), ConfigError> {
	let public = &admin_server.public;
	if !public.enabled {
		return Ok(());
	}

	let missing: Vec<&str> = [
		("public_tls_cert_file", public.tls_cert_file.is_none()),
		("public_tls_key_file", public.tls_key_file.is_none()),
		("public_client_certs_dir", public.client_certs_dir.is_none()),
	]
	.into_iter()
	.filter_map(|(key, absent)| absent.then_some(key))
	.collect();

	if !missing.is_empty() {
		return Err(ConfigError::Validation(format!(
			"admin_server.public_enabled requires {}",
			missing.join(", ")
		)));
	}

	if public.interface.parse::<std::net::IpAddr>().is_err() {
		return Err(ConfigError::InvalidValue {
			key: "admin_server.public_interface".to_string(),
			message: format!("'{}' is not an IP address", public.interface),
		});
	}

	Ok(())
}
