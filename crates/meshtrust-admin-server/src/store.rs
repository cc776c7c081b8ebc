// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mesh-scoped secret storage.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("secret store unavailable: {0}")]
	Unavailable(String),
}

/// Identifies a secret: `{mesh, name}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecretKey {
	pub mesh: String,
	pub name: String,
}

impl SecretKey {
	pub fn new(mesh: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			mesh: mesh.into(),
			name: name.into(),
		}
	}
}

impl fmt::Display for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.mesh, self.name)
	}
}

/// A secret scoped to a mesh. `Debug` never prints `data`.
#[derive(Clone, PartialEq, Eq)]
pub struct MeshSecret {
	pub key: SecretKey,
	pub data: Vec<u8>,
}

impl MeshSecret {
	pub fn new(key: SecretKey, data: impl Into<Vec<u8>>) -> Self {
		Self {
			key,
			data: data.into(),
		}
	}
}

impl fmt::Debug for MeshSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MeshSecret")
			.field("key", &self.key)
			.field("data", &"[REDACTED]")
			.finish()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
	Created,
	Updated,
}

/// Resource store backing the secret endpoints and the signing key.
///
/// Implementations must be safe to call from concurrent request handlers.
pub trait SecretStore: Send + Sync {
	fn get(&self, key: &SecretKey) -> StoreResult<Option<MeshSecret>>;

	/// All secrets of `mesh`, ordered by name.
	fn list(&self, mesh: &str) -> StoreResult<Vec<MeshSecret>>;

	fn upsert(&self, secret: MeshSecret) -> StoreResult<UpsertOutcome>;

	/// Returns whether a secret was removed.
	fn delete(&self, key: &SecretKey) -> StoreResult<bool>;
}

/// In-process store.
#[derive(Default)]
pub struct MemorySecretStore {
	secrets: RwLock<BTreeMap<SecretKey, MeshSecret>>,
}

impl MemorySecretStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SecretStore for MemorySecretStore {
	fn get(&self, key: &SecretKey) -> StoreResult<Option<MeshSecret>> {
		Ok(self.secrets.read().get(key).cloned())
	}

	fn list(&self, mesh: &str) -> StoreResult<Vec<MeshSecret>> {
		Ok(self
			.secrets
			.read()
			.values()
			.filter(|secret| secret.key.mesh == mesh)
			.cloned()
			.collect())
	}

	fn upsert(&self, secret: MeshSecret) -> StoreResult<UpsertOutcome> {
		let key = secret.key.clone();
		let previous = self.secrets.write().insert(key.clone(), secret);
		let outcome = match previous {
			Some(_) => UpsertOutcome::Updated,
			None => UpsertOutcome::Created,
		};
		debug!(secret = %key, ?outcome, "stored secret");
		Ok(outcome)
	}

	fn delete(&self, key: &SecretKey) -> StoreResult<bool> {
		Ok(self.secrets.write().remove(key).is_some())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn upsert_reports_created_then_updated() {
		let store = MemorySecretStore::new();
		let key = SecretKey::new("demo", "db-password");
		assert_eq!(
			store.upsert(MeshSecret::new(key.clone(), "one")).unwrap(),
			UpsertOutcome::Created
		);
		assert_eq!(
			store.upsert(MeshSecret::new(key.clone(), "two")).unwrap(),
			UpsertOutcome::Updated
		);
		assert_eq!(store.get(&key).unwrap().unwrap().data, b"two");
	}

	#[test]
	fn list_is_scoped_to_mesh_and_sorted() {
		let store = MemorySecretStore::new();
		store
			.upsert(MeshSecret::new(SecretKey::new("demo", "b"), "1"))
			.unwrap();
		store
			.upsert(MeshSecret::new(SecretKey::new("demo", "a"), "2"))
			.unwrap();
		store
			.upsert(MeshSecret::new(SecretKey::new("other", "c"), "3"))
			.unwrap();

		let names: Vec<_> = store
			.list("demo")
			.unwrap()
			.into_iter()
			.map(|s| s.key.name)
			.collect();
		assert_eq!(names, vec!["a", "b"]);
	}

	#[test]
	fn delete_reports_whether_secret_existed() {
		let store = MemorySecretStore::new();
		let key = SecretKey::new("demo", "x");
		assert!(!store.delete(&key).unwrap());
		store.upsert(MeshSecret::new(key.clone(), "v")).unwrap();
		assert!(store.delete(&key).unwrap());
		assert!(store.get(&key).unwrap().is_none());
	}

	#[test]
	fn debug_redacts_secret_data() {
		let secret = MeshSecret::new(SecretKey::new("demo", "x"), "hunter2");
		assert!(!format!("{secret:?}").contains("hunter2"));
	}
}
