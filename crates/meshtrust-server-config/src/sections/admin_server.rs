// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin server listener configuration.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOCAL_PORT: u16 = 5679;
pub const DEFAULT_PUBLIC_PORT: u16 = 5684;
pub const DEFAULT_PUBLIC_INTERFACE: &str = "0.0.0.0";
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Loopback listener. Always enabled, always bound to 127.0.0.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalListenerConfig {
	pub port: u16,
}

/// Mutual-TLS listener for remote callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicListenerConfig {
	pub enabled: bool,
	pub interface: String,
	pub port: u16,
	pub tls_cert_file: Option<PathBuf>,
	pub tls_key_file: Option<PathBuf>,
	/// Directory of PEM files trusted to sign client certificates.
	pub client_certs_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataplaneTokenApiConfig {
	pub enabled: bool,
}

/// Admin server configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminServerConfig {
	pub local: LocalListenerConfig,
	pub public: PublicListenerConfig,
	pub dataplane_token: DataplaneTokenApiConfig,
	/// How long in-flight requests may run after a stop signal.
	pub shutdown_grace: Duration,
}

impl Default for AdminServerConfig {
	fn default() -> Self {
		AdminServerConfigLayer::default().finalize()
	}
}

/// Admin server configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AdminServerConfigLayer {
	#[serde(default)]
	pub local_port: Option<u16>,
	#[serde(default)]
	pub public_enabled: Option<bool>,
	#[serde(default)]
	pub public_interface: Option<String>,
	#[serde(default)]
	pub public_port: Option<u16>,
	#[serde(default)]
	pub public_tls_cert_file: Option<PathBuf>,
	#[serde(default)]
	pub public_tls_key_file: Option<PathBuf>,
	#[serde(default)]
	pub public_client_certs_dir: Option<PathBuf>,
	#[serde(default)]
	pub dataplane_token_enabled: Option<bool>,
	#[serde(default)]
	pub shutdown_grace_secs: Option<u64>,
}

impl AdminServerConfigLayer {
	pub fn merge(&mut self, other: AdminServerConfigLayer) {
		if other.local_port.is_some() {
			self.local_port = other.local_port;
		}
		if other.public_enabled.is_some() {
			self.public_enabled = other.public_enabled;
		}
		if other.public_interface.is_some() {
			self.public_interface = other.public_interface;
		}
		if other.public_port.is_some() {
			self.public_port = other.public_port;
		}
		if other.public_tls_cert_file.is_some() {
			self.public_tls_cert_file = other.public_tls_cert_file;
		}
		if other.public_tls_key_file.is_some() {
			self.public_tls_key_file = other.public_tls_key_file;
		}
		if other.public_client_certs_dir.is_some() {
			self.public_client_certs_dir = other.public_client_certs_dir;
		}
		if other.dataplane_token_enabled.is_some() {
			self.dataplane_token_enabled = other.dataplane_token_enabled;
		}
		if other.shutdown_grace_secs.is_some() {
			self.shutdown_grace_secs = other.shutdown_grace_secs;
		}
	}

	pub fn finalize(self) -> AdminServerConfig {
		AdminServerConfig {
			local: LocalListenerConfig {
				port: self.local_port.unwrap_or(DEFAULT_LOCAL_PORT),
			},
			public: PublicListenerConfig {
				enabled: self.public_enabled.unwrap_or(false),
				interface: self
					.public_interface
					.unwrap_or_else(|| DEFAULT_PUBLIC_INTERFACE.to_string()),
				port: self.public_port.unwrap_or(DEFAULT_PUBLIC_PORT),
				tls_cert_file: self.public_tls_cert_file,
				tls_key_file: self.public_tls_key_file,
				client_certs_dir: self.public_client_certs_dir,
			},
			dataplane_token: DataplaneTokenApiConfig {
				enabled: self.dataplane_token_enabled.unwrap_or(true),
			},
			shutdown_grace: Duration::from_secs(
				self.shutdown_grace_secs.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
			),
		}
	}
}
