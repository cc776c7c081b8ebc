// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TLS material for the public listener.
//!
//! The public listener only accepts clients presenting a certificate that
//! chains to one of the PEM files in the configured client certificate
//! directory.

use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AdminServerError;

pub const CLIENT_CERT_SUFFIX: &str = ".pem";

/// Builds the trust pool from every `*.pem` file directly inside `dir`.
///
/// Subdirectories and files with other suffixes are ignored, as are PEM
/// blocks that do not hold a usable certificate.
///
/// # Errors
/// Fails when the directory or one of its certificate files cannot be read,
/// or when no certificate could be loaded.
pub fn load_client_cert_pool(dir: &Path) -> Result<RootCertStore, AdminServerError> {
	let dir_error = |source| AdminServerError::ClientCertsDir {
		path: dir.to_path_buf(),
		source,
	};

	let mut paths: Vec<PathBuf> = Vec::new();
	for entry in fs::read_dir(dir).map_err(dir_error)? {
		let path = entry.map_err(dir_error)?.path();
		if path.is_dir() || !has_client_cert_suffix(&path) {
			continue;
		}
		paths.push(path);
	}
	paths.sort();

	let mut pool = RootCertStore::empty();
	for path in paths {
		let pem = fs::read(&path).map_err(|source| AdminServerError::ClientCertRead {
			path: path.clone(),
			source,
		})?;

		let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(&pem)
			.filter_map(|cert| match cert {
				Ok(cert) => Some(cert),
				Err(e) => {
					warn!(path = %path.display(), error = %e, "skipping malformed PEM block");
					None
				}
			})
			.collect();

		let (added, ignored) = pool.add_parsable_certificates(certs);
		debug!(path = %path.display(), added, ignored, "loaded client certificates");
	}

	if pool.is_empty() {
		return Err(AdminServerError::NoClientCertificates(dir.to_path_buf()));
	}
	Ok(pool)
}

fn has_client_cert_suffix(path: &Path) -> bool {
	path
		.file_name()
		.map(|name| name.to_string_lossy().ends_with(CLIENT_CERT_SUFFIX))
		.unwrap_or(false)
}

/// Reads the server certificate chain and private key.
pub fn load_server_identity(
	cert_file: &Path,
	key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), AdminServerError> {
	let tls_error = |path: &Path, message: String| AdminServerError::TlsMaterial {
		path: path.to_path_buf(),
		message,
	};

	let certs = CertificateDer::pem_file_iter(cert_file)
		.and_then(|certs| certs.collect::<Result<Vec<_>, _>>())
		.map_err(|e| tls_error(cert_file, e.to_string()))?;
	if certs.is_empty() {
		return Err(tls_error(cert_file, "no certificates found".to_string()));
	}

	let key =
		PrivateKeyDer::from_pem_file(key_file).map_err(|e| tls_error(key_file, e.to_string()))?;

	Ok((certs, key))
}

/// Server TLS configuration requiring and verifying client certificates.
pub fn server_tls_config(
	cert_file: &Path,
	key_file: &Path,
	client_certs_dir: &Path,
) -> Result<Arc<ServerConfig>, AdminServerError> {
	let pool = load_client_cert_pool(client_certs_dir)?;
	let (certs, key) = load_server_identity(cert_file, key_file)?;

	let provider = Arc::new(rustls::crypto::ring::default_provider());
	let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(pool), provider.clone())
		.build()
		.map_err(|e| AdminServerError::ClientVerifier(e.to_string()))?;

	let mut config = ServerConfig::builder_with_provider(provider)
		.with_safe_default_protocol_versions()?
		.with_client_cert_verifier(verifier)
		.with_single_cert(certs, key)?;
	config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

	Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn self_signed(name: &str) -> rcgen::CertifiedKey {
		rcgen::generate_simple_self_signed(vec![name.to_string()]).unwrap()
	}

	#[test]
	fn pool_loads_only_pem_files() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("client.pem"), self_signed("client").cert.pem()).unwrap();
		fs::write(dir.path().join("notes.txt"), "not a certificate").unwrap();
		fs::create_dir(dir.path().join("nested.pem")).unwrap();
		fs::write(
			dir.path().join("nested.pem").join("other.pem"),
			self_signed("other").cert.pem(),
		)
		.unwrap();

		let pool = load_client_cert_pool(dir.path()).unwrap();
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn pool_skips_unparsable_blocks() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.pem"), "garbage").unwrap();
		fs::write(dir.path().join("b.pem"), self_signed("client").cert.pem()).unwrap();

		let pool = load_client_cert_pool(dir.path()).unwrap();
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn empty_pool_is_an_error() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.pem"), "garbage").unwrap();

		let err = load_client_cert_pool(dir.path()).unwrap_err();
		assert!(matches!(err, AdminServerError::NoClientCertificates(_)));
	}

	#[test]
	fn missing_directory_is_an_error() {
		let dir = TempDir::new().unwrap();
		let err = load_client_cert_pool(&dir.path().join("absent")).unwrap_err();
		assert!(matches!(err, AdminServerError::ClientCertsDir { .. }));
	}

	#[test]
	fn server_config_requires_client_auth() {
		let dir = TempDir::new().unwrap();
		let server = self_signed("localhost");
		let cert_file = dir.path().join("server.crt");
		let key_file = dir.path().join("server.key");
		fs::write(&cert_file, server.cert.pem()).unwrap();
		fs::write(&key_file, server.key_pair.serialize_pem()).unwrap();

		let clients = dir.path().join("clients");
		fs::create_dir(&clients).unwrap();
		fs::write(clients.join("client.pem"), self_signed("client").cert.pem()).unwrap();

		let config = server_tls_config(&cert_file, &key_file, &clients).unwrap();
		assert_eq!(config.alpn_protocols[1], b"http/1.1".to_vec());
	}

	#[test]
	fn missing_key_is_reported_with_path() {
		let dir = TempDir::new().unwrap();
		let server = self_signed("localhost");
		let cert_file = dir.path().join("server.crt");
		fs::write(&cert_file, server.cert.pem()).unwrap();

		let err = load_server_identity(&cert_file, &dir.path().join("server.key")).unwrap_err();
		match err {
			AdminServerError::TlsMaterial { path, .. } => assert!(path.ends_with("server.key")),
			other => panic!("unexpected error: {other}"),
		}
	}
}
