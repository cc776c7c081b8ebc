// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the dataplane token endpoints.
//!
//! Talks to either listener: plain HTTP on loopback, or HTTPS with a client
//! identity against the public listener.

use meshtrust_tokens::{Credential, DataplaneIdentity, MultiValueTagSet};
use reqwest::{Certificate, Client, Identity, Response};
use std::net::SocketAddr;
use tracing::instrument;

use crate::error::ErrorResponse;
use crate::routes::tokens::{DataplaneTokenRequest, TagValues};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("server returned {status}: {message}")]
	Server { status: u16, message: String },
}

pub struct DataplaneTokenClient {
	http: Client,
	base_url: String,
}

/// Builder for [`DataplaneTokenClient`].
pub struct DataplaneTokenClientBuilder {
	base_url: String,
	ca_certificate: Option<Vec<u8>>,
	identity: Option<Vec<u8>>,
	resolve: Vec<(String, SocketAddr)>,
}

impl DataplaneTokenClientBuilder {
	/// PEM CA that signed the server certificate.
	pub fn ca_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.ca_certificate = Some(pem.into());
		self
	}

	/// PEM client certificate followed by its private key.
	pub fn identity(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.identity = Some(pem.into());
		self
	}

	/// Pins `domain` to `addr` instead of resolving it.
	pub fn resolve(mut self, domain: impl Into<String>, addr: SocketAddr) -> Self {
		self.resolve.push((domain.into(), addr));
		self
	}

	pub fn build(self) -> Result<DataplaneTokenClient, ClientError> {
		let mut builder = Client::builder().use_rustls_tls();
		if let Some(pem) = self.ca_certificate {
			builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
		}
		if let Some(pem) = self.identity {
			builder = builder.identity(Identity::from_pem(&pem)?);
		}
		for (domain, addr) in &self.resolve {
			builder = builder.resolve(domain, *addr);
		}

		Ok(DataplaneTokenClient {
			http: builder.build()?,
			base_url: self.base_url.trim_end_matches('/').to_string(),
		})
	}
}

impl DataplaneTokenClient {
	pub fn builder(base_url: impl Into<String>) -> DataplaneTokenClientBuilder {
		DataplaneTokenClientBuilder {
			base_url: base_url.into(),
			ca_certificate: None,
			identity: None,
			resolve: Vec::new(),
		}
	}

	fn api_url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// Requests a token for `name` in `mesh`. An empty `name` asks for a
	/// mesh-wide token.
	#[instrument(skip(self, tags))]
	pub async fn generate(
		&self,
		name: &str,
		mesh: &str,
		tags: &MultiValueTagSet,
	) -> Result<Credential, ClientError> {
		let request = DataplaneTokenRequest {
			name: name.to_string(),
			mesh: mesh.to_string(),
			tags: tags
				.iter()
				.map(|(tag, values)| (tag.to_string(), TagValues::List(values.iter().cloned().collect())))
				.collect(),
		};
		let response = self
			.http
			.post(self.api_url("/tokens"))
			.json(&request)
			.send()
			.await?;
		let response = check_status(response).await?;
		Ok(Credential::new(response.text().await?))
	}

	#[instrument(skip_all)]
	pub async fn validate(&self, credential: &Credential) -> Result<DataplaneIdentity, ClientError> {
		let response = self
			.http
			.post(self.api_url("/tokens/validate"))
			.body(credential.as_str().to_string())
			.send()
			.await?;
		let response = check_status(response).await?;
		Ok(response.json().await?)
	}
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
	if response.status().is_success() {
		return Ok(response);
	}

	let status = response.status().as_u16();
	let body = response.text().await.unwrap_or_default();
	let message = serde_json::from_str::<ErrorResponse>(&body)
		.map(|error| error.message)
		.unwrap_or(body);
	Err(ClientError::Server { status, message })
}
