// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signing key sources backed by the secret store.

use crate::store::{MeshSecret, SecretKey, SecretStore, StoreError, UpsertOutcome};
use meshtrust_server_config::SigningKeyConfig;
use meshtrust_tokens::{FileKeySource, KeySourceError, SigningKey, SigningKeySource};
use std::sync::Arc;
use tracing::{info, instrument};

/// Secret holding the dataplane token signing key.
pub const SIGNING_KEY_SECRET_NAME: &str = "dataplane-token-signing-key";
/// Mesh the signing key secret lives in.
pub const SIGNING_KEY_SECRET_MESH: &str = "default";

pub fn signing_key_secret() -> SecretKey {
	SecretKey::new(SIGNING_KEY_SECRET_MESH, SIGNING_KEY_SECRET_NAME)
}

/// Reads the signing key secret on every call. A missing secret is an empty key.
pub struct SecretStoreKeySource {
	store: Arc<dyn SecretStore>,
	key: SecretKey,
}

impl SecretStoreKeySource {
	pub fn new(store: Arc<dyn SecretStore>) -> Self {
		Self {
			store,
			key: signing_key_secret(),
		}
	}
}

impl SigningKeySource for SecretStoreKeySource {
	fn signing_key(&self) -> Result<SigningKey, KeySourceError> {
		Ok(self
			.store
			.get(&self.key)?
			.map(|secret| SigningKey::new(secret.data))
			.unwrap_or_default())
	}
}

/// Stores a fresh random signing key unless one exists.
///
/// Returns true when a key was created.
#[instrument(skip(store))]
pub fn bootstrap_signing_key(store: &dyn SecretStore) -> Result<bool, StoreError> {
	let key = signing_key_secret();
	if store.get(&key)?.is_some_and(|secret| !secret.data.is_empty()) {
		return Ok(false);
	}

	let generated = SigningKey::generate();
	let outcome = store.upsert(MeshSecret::new(key.clone(), generated.expose()))?;
	info!(secret = %key, created = outcome == UpsertOutcome::Created, "generated dataplane token signing key");
	Ok(true)
}

/// Builds the key source selected by configuration.
///
/// A configured file wins over the store. The store-backed source is
/// bootstrapped first when enabled.
pub fn signing_key_source(
	config: &SigningKeyConfig,
	store: Arc<dyn SecretStore>,
) -> Result<Arc<dyn SigningKeySource>, StoreError> {
	if let Some(path) = &config.file {
		info!(path = %path.display(), "reading dataplane token signing key from file");
		return Ok(Arc::new(FileKeySource::new(path.clone())));
	}

	if config.bootstrap {
		bootstrap_signing_key(store.as_ref())?;
	}
	Ok(Arc::new(SecretStoreKeySource::new(store)))
}
