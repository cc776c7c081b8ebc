// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::MeshtrustConfigLayer;
use crate::sections::{
	AdminServerConfigLayer, ControlPlaneConfigLayer, LoggingConfigLayer, SigningKeyConfigLayer,
};

/// Path of the system-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/meshtrust/admin-server.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<MeshtrustConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<MeshtrustConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(MeshtrustConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<MeshtrustConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(MeshtrustConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: MeshtrustConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: MESHTRUST_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<MeshtrustConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(MeshtrustConfigLayer {
			admin_server: Some(load_admin_server_from_env()?),
			control_plane: Some(load_control_plane_from_env()?),
			signing_key: Some(load_signing_key_from_env()),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: Display,
{
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid value '{v}': {e}"),
		}),
		None => Ok(None),
	}
}

fn load_admin_server_from_env() -> Result<AdminServerConfigLayer, ConfigError> {
	Ok(AdminServerConfigLayer {
		local_port: env_parse("MESHTRUST_ADMIN_SERVER_LOCAL_PORT")?,
		public_enabled: env_bool("MESHTRUST_ADMIN_SERVER_PUBLIC_ENABLED"),
		public_interface: env_var("MESHTRUST_ADMIN_SERVER_PUBLIC_INTERFACE"),
		public_port: env_parse("MESHTRUST_ADMIN_SERVER_PUBLIC_PORT")?,
		public_tls_cert_file: env_var("MESHTRUST_ADMIN_SERVER_PUBLIC_TLS_CERT_FILE").map(PathBuf::from),
		public_tls_key_file: env_var("MESHTRUST_ADMIN_SERVER_PUBLIC_TLS_KEY_FILE").map(PathBuf::from),
		public_client_certs_dir: env_var("MESHTRUST_ADMIN_SERVER_PUBLIC_CLIENT_CERTS_DIR")
			.map(PathBuf::from),
		dataplane_token_enabled: env_bool("MESHTRUST_ADMIN_SERVER_APIS_DATAPLANE_TOKEN_ENABLED"),
		shutdown_grace_secs: env_parse("MESHTRUST_ADMIN_SERVER_SHUTDOWN_GRACE_SECS")?,
	})
}

fn load_control_plane_from_env() -> Result<ControlPlaneConfigLayer, ConfigError> {
	Ok(ControlPlaneConfigLayer {
		mode: env_parse("MESHTRUST_MODE")?,
		environment: env_parse("MESHTRUST_ENVIRONMENT")?,
		read_only: env_bool("MESHTRUST_API_SERVER_READ_ONLY"),
	})
}

fn load_signing_key_from_env() -> SigningKeyConfigLayer {
	SigningKeyConfigLayer {
		file: env_var("MESHTRUST_SIGNING_KEY_FILE").map(PathBuf::from),
		bootstrap: env_bool("MESHTRUST_SIGNING_KEY_BOOTSTRAP"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("MESHTRUST_LOG_LEVEL"),
		format: env_parse("MESHTRUST_LOG_FORMAT")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}

	#[test]
	fn test_missing_toml_file_is_empty_layer() {
		let dir = tempfile::tempdir().unwrap();
		let layer = TomlSource::new(dir.path().join("absent.toml")).load().unwrap();
		assert_eq!(layer, MeshtrustConfigLayer::default());
	}

	#[test]
	fn test_toml_file_is_parsed() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[admin_server]\nlocal_port = 7000").unwrap();
		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.admin_server.unwrap().local_port, Some(7000));
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[admin_server\nlocal_port = ").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_var_ignores_unset_variable() {
		assert!(env_var("MESHTRUST_TEST_SURELY_UNSET_VARIABLE").is_none());
		assert!(env_parse::<u16>("MESHTRUST_TEST_SURELY_UNSET_VARIABLE")
			.unwrap()
			.is_none());
	}
}
