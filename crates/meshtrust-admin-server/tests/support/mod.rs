// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use meshtrust_admin_server::{setup_api, MemorySecretStore, SecretStore};
use meshtrust_server_config::{AdminServerConfig, MeshtrustConfig};
use rcgen::{
	BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
	KeyPair, KeyUsagePurpose,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Certificates for exercising the public listener.
///
/// One CA signs the server certificate and the trusted client. The untrusted
/// client is signed by a CA the server does not know.
pub struct TestPki {
	pub dir: TempDir,
	pub ca_pem: String,
	pub server_cert_file: PathBuf,
	pub server_key_file: PathBuf,
	pub client_certs_dir: PathBuf,
	pub trusted_identity: String,
	pub untrusted_identity: String,
}

struct TestCa {
	cert: Certificate,
	key: KeyPair,
}

impl TestCa {
	fn new(name: &str) -> Self {
		let key = KeyPair::generate().unwrap();
		let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
		params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
		params.distinguished_name.push(DnType::CommonName, name);
		params.key_usages = vec![
			KeyUsagePurpose::KeyCertSign,
			KeyUsagePurpose::CrlSign,
			KeyUsagePurpose::DigitalSignature,
		];
		let cert = params.self_signed(&key).unwrap();
		Self { cert, key }
	}

	fn issue(&self, name: &str, purpose: ExtendedKeyUsagePurpose) -> (Certificate, KeyPair) {
		let key = KeyPair::generate().unwrap();
		let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
		params.distinguished_name.push(DnType::CommonName, name);
		params.extended_key_usages = vec![purpose];
		let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
		(cert, key)
	}

	fn client_identity(&self, name: &str) -> String {
		let (cert, key) = self.issue(name, ExtendedKeyUsagePurpose::ClientAuth);
		format!("{}{}", cert.pem(), key.serialize_pem())
	}
}

impl TestPki {
	pub fn generate() -> Self {
		let dir = TempDir::new().unwrap();
		let ca = TestCa::new("meshtrust test CA");
		let stranger = TestCa::new("unknown CA");

		let (server_cert, server_key) = ca.issue("localhost", ExtendedKeyUsagePurpose::ServerAuth);
		let server_cert_file = dir.path().join("admin-server.crt");
		let server_key_file = dir.path().join("admin-server.key");
		fs::write(&server_cert_file, server_cert.pem()).unwrap();
		fs::write(&server_key_file, server_key.serialize_pem()).unwrap();

		let client_certs_dir = dir.path().join("clients");
		fs::create_dir(&client_certs_dir).unwrap();
		fs::write(client_certs_dir.join("ca.pem"), ca.cert.pem()).unwrap();

		Self {
			ca_pem: ca.cert.pem(),
			server_cert_file,
			server_key_file,
			client_certs_dir,
			trusted_identity: ca.client_identity("operator"),
			untrusted_identity: stranger.client_identity("intruder"),
			dir,
		}
	}
}

/// Loopback only, on an ephemeral port.
pub fn loopback_config() -> AdminServerConfig {
	let mut config = AdminServerConfig::default();
	config.local.port = 0;
	config.shutdown_grace = Duration::from_millis(200);
	config
}

/// Both listeners on ephemeral loopback ports.
pub fn dual_config(pki: &TestPki) -> AdminServerConfig {
	let mut config = loopback_config();
	config.public.enabled = true;
	config.public.interface = "127.0.0.1".to_string();
	config.public.port = 0;
	config.public.tls_cert_file = Some(pki.server_cert_file.clone());
	config.public.tls_key_file = Some(pki.server_key_file.clone());
	config.public.client_certs_dir = Some(pki.client_certs_dir.clone());
	config
}

pub fn router(config: &MeshtrustConfig) -> axum::Router {
	let store: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new());
	setup_api(config, store).unwrap().router()
}
