// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HS256 issuance and validation of dataplane tokens.
//!
//! Tokens carry the identity as `Name`, `Mesh` and `Tags` claims next to the
//! registered JWT claims. The registered claims are never populated, so tokens
//! do not expire and stay valid for as long as the signing key that produced
//! them. An `exp` set by some other issuer is still honoured.

use crate::error::{TokenError, TokenResult};
use crate::identity::{DataplaneIdentity, MultiValueTagSet};
use crate::signing_key::{KeySourceError, SigningKey, SigningKeySource};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize)]
struct DataplaneClaims {
	#[serde(rename = "Name", default)]
	name: String,
	#[serde(rename = "Mesh", default)]
	mesh: String,
	#[serde(rename = "Tags", default)]
	tags: BTreeMap<String, Vec<String>>,
	#[serde(flatten)]
	registered: RegisteredClaims,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RegisteredClaims {
	#[serde(skip_serializing_if = "Option::is_none")]
	aud: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	exp: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	jti: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	iat: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	iss: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	nbf: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	sub: Option<String>,
}

/// A signed dataplane token in compact JWS form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Credential([REDACTED])")
	}
}

impl From<String> for Credential {
	fn from(token: String) -> Self {
		Self(token)
	}
}

impl From<&str> for Credential {
	fn from(token: &str) -> Self {
		Self(token.to_string())
	}
}

/// Issues and validates dataplane tokens with a key fetched per call.
#[derive(Clone)]
pub struct DataplaneTokenIssuer {
	signing_key_source: Arc<dyn SigningKeySource>,
}

impl DataplaneTokenIssuer {
	pub fn new<S: SigningKeySource + 'static>(source: S) -> Self {
		Self {
			signing_key_source: Arc::new(source),
		}
	}

	/// Wraps a closure as the key source.
	pub fn from_fn<F>(source: F) -> Self
	where
		F: Fn() -> Result<SigningKey, KeySourceError> + Send + Sync + 'static,
	{
		Self::new(source)
	}

	pub fn from_shared(source: Arc<dyn SigningKeySource>) -> Self {
		Self {
			signing_key_source: source,
		}
	}

	fn signing_key(&self) -> TokenResult<SigningKey> {
		let key = self
			.signing_key_source
			.signing_key()
			.map_err(TokenError::KeySource)?;
		if key.is_empty() {
			return Err(TokenError::SigningKeyNotFound);
		}
		Ok(key)
	}

	/// Signs `identity` into a token.
	///
	/// Tag values are written sorted. A tag with no values is kept as an empty
	/// list.
	#[instrument(skip(self, identity), fields(mesh = %identity.mesh, name = %identity.name))]
	pub fn generate(&self, identity: &DataplaneIdentity) -> TokenResult<Credential> {
		let signing_key = self.signing_key()?;
		let claims = DataplaneClaims {
			name: identity.name.clone(),
			mesh: identity.mesh.clone(),
			tags: identity.tags.to_sequences(),
			registered: RegisteredClaims::default(),
		};

		let token = encode(
			&Header::new(ALGORITHM),
			&claims,
			&EncodingKey::from_secret(signing_key.expose()),
		)
		.map_err(TokenError::Signing)?;

		debug!(tags = claims.tags.len(), "issued dataplane token");
		Ok(Credential(token))
	}

	/// Verifies the signature of `credential` and returns the identity it
	/// asserts.
	///
	/// Binding the identity to a connecting proxy is left to
	/// [`crate::DataplaneAuthenticator`].
	#[instrument(skip_all)]
	pub fn validate(&self, credential: &Credential) -> TokenResult<DataplaneIdentity> {
		let signing_key = self.signing_key()?;

		let data = decode::<DataplaneClaims>(
			credential.as_str(),
			&DecodingKey::from_secret(signing_key.expose()),
			&validation(),
		)
		.map_err(TokenError::from_decode)?;

		let claims = data.claims;
		debug!(mesh = %claims.mesh, name = %claims.name, "validated dataplane token");
		Ok(DataplaneIdentity {
			name: claims.name,
			mesh: claims.mesh,
			tags: claims.tags.into_iter().collect::<MultiValueTagSet>(),
		})
	}
}

impl fmt::Debug for DataplaneTokenIssuer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DataplaneTokenIssuer").finish_non_exhaustive()
	}
}

fn validation() -> Validation {
	let mut validation = Validation::new(ALGORITHM);
	validation.required_spec_claims.clear();
	validation.validate_aud = false;
	validation
}

#[cfg(test)]
mod tests {
	use super::*;
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use base64::Engine;
	use std::sync::Mutex;

	fn decode_payload(token: &str) -> serde_json::Value {
		let payload = token.split('.').nth(1).unwrap();
		serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
	}

	fn issuer_with_key(key: &'static str) -> DataplaneTokenIssuer {
		DataplaneTokenIssuer::from_fn(move || Ok(SigningKey::from(key)))
	}

	#[test]
	fn roundtrip_preserves_identity() {
		let issuer = issuer_with_key("k1");
		let identity = DataplaneIdentity::for_dataplane("dp-1", "demo")
			.with_tag("kuma.io/service", "web")
			.with_tag("kuma.io/service", "api")
			.with_tag("version", "v1");

		let credential = issuer.generate(&identity).unwrap();
		assert_eq!(issuer.validate(&credential).unwrap(), identity);
	}

	#[test]
	fn token_uses_wire_claim_names_and_hs256() {
		let issuer = issuer_with_key("k1");
		let identity = DataplaneIdentity::for_dataplane("dp-1", "demo")
			.with_tag("kuma.io/service", "web")
			.with_tag("kuma.io/service", "api");

		let credential = issuer.generate(&identity).unwrap();
		let header = jsonwebtoken::decode_header(credential.as_str()).unwrap();
		assert_eq!(header.alg, Algorithm::HS256);

		let payload = decode_payload(credential.as_str());
		assert_eq!(payload["Name"], "dp-1");
		assert_eq!(payload["Mesh"], "demo");
		assert_eq!(payload["Tags"]["kuma.io/service"], serde_json::json!(["api", "web"]));
		assert!(payload.get("exp").is_none());
		assert!(payload.get("iat").is_none());
	}

	#[test]
	fn mesh_wide_token_validates_with_empty_name() {
		let issuer = issuer_with_key("k1");
		let credential = issuer.generate(&DataplaneIdentity::for_mesh("demo")).unwrap();
		let identity = issuer.validate(&credential).unwrap();
		assert_eq!(identity.name, "");
		assert_eq!(identity.mesh, "demo");
		assert!(identity.tags.is_empty());
	}

	#[test]
	fn empty_key_fails_both_operations() {
		let issuer = issuer_with_key("");
		let err = issuer
			.generate(&DataplaneIdentity::for_mesh("demo"))
			.unwrap_err();
		assert!(matches!(err, TokenError::SigningKeyNotFound));

		let err = issuer.validate(&Credential::from("a.b.c")).unwrap_err();
		assert!(matches!(err, TokenError::SigningKeyNotFound));
	}

	#[test]
	fn key_source_error_is_propagated() {
		let issuer = DataplaneTokenIssuer::from_fn(|| Err("store offline".into()));
		let err = issuer
			.generate(&DataplaneIdentity::for_mesh("demo"))
			.unwrap_err();
		assert!(matches!(err, TokenError::KeySource(_)));
		assert!(err.to_string().contains("store offline"));
	}

	#[test]
	fn wrong_key_is_a_parse_error() {
		let credential = issuer_with_key("k1")
			.generate(&DataplaneIdentity::for_mesh("demo"))
			.unwrap();
		let err = issuer_with_key("k2").validate(&credential).unwrap_err();
		assert!(matches!(err, TokenError::Parse(_)));
	}

	#[test]
	fn garbage_is_a_parse_error() {
		let err = issuer_with_key("k1")
			.validate(&Credential::from("not-a-token"))
			.unwrap_err();
		assert!(matches!(err, TokenError::Parse(_)));
	}

	#[test]
	fn other_algorithm_is_rejected() {
		let claims = serde_json::json!({"Name": "", "Mesh": "demo", "Tags": {}});
		let token = encode(
			&Header::new(Algorithm::HS512),
			&claims,
			&EncodingKey::from_secret(b"k1"),
		)
		.unwrap();
		let err = issuer_with_key("k1")
			.validate(&Credential::from(token))
			.unwrap_err();
		assert!(matches!(err, TokenError::InvalidToken(_)));
	}

	#[test]
	fn expired_foreign_token_is_rejected() {
		let claims = serde_json::json!({"Name": "", "Mesh": "demo", "exp": 1_000});
		let token = encode(&Header::new(ALGORITHM), &claims, &EncodingKey::from_secret(b"k1")).unwrap();
		let err = issuer_with_key("k1")
			.validate(&Credential::from(token))
			.unwrap_err();
		assert!(matches!(err, TokenError::InvalidToken(_)));
	}

	#[test]
	fn rotation_is_observed_on_next_call() {
		let current = Arc::new(Mutex::new("k1"));
		let source = current.clone();
		let issuer =
			DataplaneTokenIssuer::from_fn(move || Ok(SigningKey::from(*source.lock().unwrap())));

		let identity = DataplaneIdentity::for_mesh("demo");
		let old = issuer.generate(&identity).unwrap();

		*current.lock().unwrap() = "k2";
		assert!(matches!(issuer.validate(&old), Err(TokenError::Parse(_))));
		let new = issuer.generate(&identity).unwrap();
		assert!(issuer.validate(&new).is_ok());

		*current.lock().unwrap() = "k1";
		assert!(issuer.validate(&old).is_ok());
	}

	#[test]
	fn credential_debug_is_redacted() {
		let credential = Credential::from("header.payload.signature");
		assert!(!format!("{credential:?}").contains("payload"));
	}
}
