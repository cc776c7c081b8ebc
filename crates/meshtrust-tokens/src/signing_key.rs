// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signing key material and the sources it is fetched from.

use rand::RngCore;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Failure reported by a [`SigningKeySource`].
pub type KeySourceError = Box<dyn std::error::Error + Send + Sync>;

/// Raw HMAC key bytes.
///
/// Zeroed on drop. `Debug` never prints the bytes.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
	/// Length in bytes of keys produced by [`SigningKey::generate`].
	pub const GENERATED_LEN: usize = 32;

	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(Zeroizing::new(bytes.into()))
	}

	/// The "no key configured" value.
	pub fn empty() -> Self {
		Self::new(Vec::new())
	}

	/// A fresh random 256-bit key from the OS RNG.
	pub fn generate() -> Self {
		let mut bytes = Zeroizing::new(vec![0u8; Self::GENERATED_LEN]);
		rand::rngs::OsRng.fill_bytes(&mut bytes);
		Self(bytes)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn expose(&self) -> &[u8] {
		&self.0
	}
}

impl Default for SigningKey {
	fn default() -> Self {
		Self::empty()
	}
}

impl fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningKey")
			.field("len", &self.0.len())
			.field("bytes", &"[REDACTED]")
			.finish()
	}
}

impl From<Vec<u8>> for SigningKey {
	fn from(bytes: Vec<u8>) -> Self {
		Self::new(bytes)
	}
}

impl From<&[u8]> for SigningKey {
	fn from(bytes: &[u8]) -> Self {
		Self::new(bytes)
	}
}

impl From<&str> for SigningKey {
	fn from(key: &str) -> Self {
		Self::new(key.as_bytes())
	}
}

/// Supplies the current signing key.
///
/// Called on every issue and validate. Returning an empty key means no key is
/// configured; returning an error means the key store could not be read.
pub trait SigningKeySource: Send + Sync {
	fn signing_key(&self) -> Result<SigningKey, KeySourceError>;
}

impl<F> SigningKeySource for F
where
	F: Fn() -> Result<SigningKey, KeySourceError> + Send + Sync,
{
	fn signing_key(&self) -> Result<SigningKey, KeySourceError> {
		self()
	}
}

impl<S: SigningKeySource + ?Sized> SigningKeySource for Arc<S> {
	fn signing_key(&self) -> Result<SigningKey, KeySourceError> {
		(**self).signing_key()
	}
}

/// Error reading a key file.
#[derive(Debug, thiserror::Error)]
#[error("failed to read signing key file {path}: {source}")]
pub struct KeyFileError {
	pub path: PathBuf,
	#[source]
	pub source: io::Error,
}

/// Reads the key from a file on every call.
///
/// A missing file yields an empty key. A single trailing newline is stripped
/// so keys written with `echo` work.
#[derive(Debug, Clone)]
pub struct FileKeySource {
	path: PathBuf,
}

impl FileKeySource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl SigningKeySource for FileKeySource {
	fn signing_key(&self) -> Result<SigningKey, KeySourceError> {
		match std::fs::read(&self.path) {
			Ok(bytes) => {
				let mut bytes = Zeroizing::new(bytes);
				if bytes.last() == Some(&b'\n') {
					bytes.pop();
				}
				Ok(SigningKey(bytes))
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "signing key file does not exist");
				Ok(SigningKey::empty())
			}
			Err(source) => Err(Box::new(KeyFileError {
				path: self.path.clone(),
				source,
			})),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn debug_redacts_key_bytes() {
		let key = SigningKey::from("super-secret");
		let debug = format!("{key:?}");
		assert!(!debug.contains("super-secret"));
		assert!(debug.contains("REDACTED"));
	}

	#[test]
	fn generated_keys_are_random_and_full_length() {
		let a = SigningKey::generate();
		let b = SigningKey::generate();
		assert_eq!(a.len(), SigningKey::GENERATED_LEN);
		assert_ne!(a.expose(), b.expose());
	}

	#[test]
	fn closure_is_a_key_source() {
		let source = || -> Result<SigningKey, KeySourceError> { Ok(SigningKey::from("k1")) };
		assert_eq!(source.signing_key().unwrap().expose(), b"k1");
	}

	#[test]
	fn file_source_strips_single_trailing_newline() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "file-key").unwrap();
		let source = FileKeySource::new(file.path());
		assert_eq!(source.signing_key().unwrap().expose(), b"file-key");
	}

	#[test]
	fn file_source_rereads_on_every_call() {
		let file = NamedTempFile::new().unwrap();
		std::fs::write(file.path(), "k1").unwrap();
		let source = FileKeySource::new(file.path());
		assert_eq!(source.signing_key().unwrap().expose(), b"k1");

		std::fs::write(file.path(), "k2").unwrap();
		assert_eq!(source.signing_key().unwrap().expose(), b"k2");
	}

	#[test]
	fn missing_file_is_an_empty_key() {
		let dir = tempfile::tempdir().unwrap();
		let source = FileKeySource::new(dir.path().join("absent.key"));
		assert!(source.signing_key().unwrap().is_empty());
	}

	#[test]
	fn unreadable_path_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		// Reading a directory as a file fails with something other than NotFound.
		let source = FileKeySource::new(dir.path());
		assert!(source.signing_key().is_err());
	}
}
