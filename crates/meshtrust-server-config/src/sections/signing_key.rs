// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where the dataplane token signing key comes from.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyConfig {
	/// Read the key from this file on every use instead of the secret store.
	pub file: Option<PathBuf>,
	/// Generate a random key into the secret store when none exists.
	pub bootstrap: bool,
}

impl Default for SigningKeyConfig {
	fn default() -> Self {
		Self {
			file: None,
			bootstrap: true,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SigningKeyConfigLayer {
	#[serde(default)]
	pub file: Option<PathBuf>,
	#[serde(default)]
	pub bootstrap: Option<bool>,
}

impl SigningKeyConfigLayer {
	pub fn merge(&mut self, other: SigningKeyConfigLayer) {
		if other.file.is_some() {
			self.file = other.file;
		}
		if other.bootstrap.is_some() {
			self.bootstrap = other.bootstrap;
		}
	}

	pub fn finalize(self) -> SigningKeyConfig {
		SigningKeyConfig {
			file: self.file,
			bootstrap: self.bootstrap.unwrap_or(true),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_bootstraps_store_key() {
		let config = SigningKeyConfigLayer::default().finalize();
		assert!(config.file.is_none());
		assert!(config.bootstrap);
		assert_eq!(config, SigningKeyConfig::default());
	}

	#[test]
	fn test_file_overrides() {
		let mut base = SigningKeyConfigLayer {
			file: None,
			bootstrap: Some(false),
		};
		base.merge(SigningKeyConfigLayer {
			file: Some(PathBuf::from("/run/secrets/signing.key")),
			bootstrap: None,
		});
		let config = base.finalize();
		assert_eq!(config.file, Some(PathBuf::from("/run/secrets/signing.key")));
		assert!(!config.bootstrap);
	}
}
