// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Binds a validated token to the proxy presenting it.

use crate::error::TokenError;
use crate::identity::DataplaneIdentity;
use crate::issuer::{Credential, DataplaneTokenIssuer};
use thiserror::Error;
use tracing::{debug, instrument};

/// How token tags are compared with the tags a proxy declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagBinding {
	/// For each tag in the token the proxy must declare exactly the same
	/// values.
	#[default]
	Exact,
	/// For each tag in the token the proxy must declare at least those values.
	Superset,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
	#[error(transparent)]
	Token(#[from] TokenError),

	#[error("proxy name {dataplane:?} does not match the token name {token:?}")]
	NameMismatch { dataplane: String, token: String },

	#[error("proxy mesh {dataplane:?} does not match the token mesh {token:?}")]
	MeshMismatch { dataplane: String, token: String },

	#[error("tag {tag:?} must have values {required:?}, proxy declares {declared:?}")]
	TagMismatch {
		tag: String,
		required: Vec<String>,
		declared: Vec<String>,
	},
}

/// Authenticates connecting proxies with dataplane tokens.
#[derive(Debug, Clone)]
pub struct DataplaneAuthenticator {
	issuer: DataplaneTokenIssuer,
	tag_binding: TagBinding,
}

impl DataplaneAuthenticator {
	pub fn new(issuer: DataplaneTokenIssuer) -> Self {
		Self {
			issuer,
			tag_binding: TagBinding::default(),
		}
	}

	pub fn with_tag_binding(mut self, tag_binding: TagBinding) -> Self {
		self.tag_binding = tag_binding;
		self
	}

	/// Validates `credential` and checks it against the proxy description.
	///
	/// Returns the identity asserted by the token.
	#[instrument(skip_all, fields(mesh = %dataplane.mesh, name = %dataplane.name))]
	pub fn authenticate(
		&self,
		credential: &Credential,
		dataplane: &DataplaneIdentity,
	) -> Result<DataplaneIdentity, AuthenticationError> {
		let identity = self.issuer.validate(credential)?;
		check_binding(&identity, dataplane, self.tag_binding)?;
		debug!("dataplane authenticated");
		Ok(identity)
	}
}

/// Checks that `dataplane` is allowed to use a token asserting `token`.
///
/// Empty token name or mesh matches any proxy. Tags absent from the token are
/// not constrained. A tag the token binds must be declared by the proxy, even
/// when the token lists no values for it.
pub fn check_binding(
	token: &DataplaneIdentity,
	dataplane: &DataplaneIdentity,
	binding: TagBinding,
) -> Result<(), AuthenticationError> {
	if !token.name.is_empty() && token.name != dataplane.name {
		return Err(AuthenticationError::NameMismatch {
			dataplane: dataplane.name.clone(),
			token: token.name.clone(),
		});
	}
	if !token.mesh.is_empty() && token.mesh != dataplane.mesh {
		return Err(AuthenticationError::MeshMismatch {
			dataplane: dataplane.mesh.clone(),
			token: token.mesh.clone(),
		});
	}

	for (tag, required) in token.tags.iter() {
		let declared = dataplane.tags.value_set(tag);
		let satisfied = match (binding, declared) {
			(TagBinding::Exact, Some(declared)) => declared == required,
			(TagBinding::Superset, Some(declared)) => required.is_subset(declared),
			(_, None) => false,
		};
		if !satisfied {
			return Err(AuthenticationError::TagMismatch {
				tag: tag.to_string(),
				required: required.iter().cloned().collect(),
				declared: dataplane.tags.values(tag).into_iter().map(String::from).collect(),
			});
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::identity::MultiValueTagSet;
	use crate::signing_key::SigningKey;

	fn authenticator() -> DataplaneAuthenticator {
		DataplaneAuthenticator::new(DataplaneTokenIssuer::from_fn(|| Ok(SigningKey::from("k1"))))
	}

	fn web_dataplane() -> DataplaneIdentity {
		DataplaneIdentity::for_dataplane("dp-1", "demo")
			.with_tag("kuma.io/service", "web")
			.with_tag("kuma.io/service", "api")
			.with_tag("version", "v1")
	}

	#[test]
	fn mesh_wide_token_accepts_any_proxy_in_mesh() {
		let auth = authenticator();
		let credential = auth
			.issuer
			.generate(&DataplaneIdentity::for_mesh("demo"))
			.unwrap();
		let identity = auth.authenticate(&credential, &web_dataplane()).unwrap();
		assert_eq!(identity.mesh, "demo");
	}

	#[test]
	fn name_mismatch_is_rejected() {
		let token = DataplaneIdentity::for_dataplane("dp-2", "demo");
		let err = check_binding(&token, &web_dataplane(), TagBinding::Exact).unwrap_err();
		assert!(matches!(err, AuthenticationError::NameMismatch { .. }));
	}

	#[test]
	fn mesh_mismatch_is_rejected() {
		let token = DataplaneIdentity::for_mesh("other");
		let err = check_binding(&token, &web_dataplane(), TagBinding::Exact).unwrap_err();
		assert!(matches!(err, AuthenticationError::MeshMismatch { .. }));
	}

	#[test]
	fn exact_binding_requires_identical_values() {
		let token = DataplaneIdentity::for_mesh("demo").with_tag("kuma.io/service", "web");
		let err = check_binding(&token, &web_dataplane(), TagBinding::Exact).unwrap_err();
		match err {
			AuthenticationError::TagMismatch { tag, required, declared } => {
				assert_eq!(tag, "kuma.io/service");
				assert_eq!(required, vec!["web"]);
				assert_eq!(declared, vec!["api", "web"]);
			}
			other => panic!("unexpected error: {other}"),
		}

		let token = DataplaneIdentity::for_mesh("demo")
			.with_tag("kuma.io/service", "api")
			.with_tag("kuma.io/service", "web");
		assert!(check_binding(&token, &web_dataplane(), TagBinding::Exact).is_ok());
	}

	#[test]
	fn superset_binding_accepts_extra_proxy_values() {
		let token = DataplaneIdentity::for_mesh("demo").with_tag("kuma.io/service", "web");
		assert!(check_binding(&token, &web_dataplane(), TagBinding::Superset).is_ok());

		let token = DataplaneIdentity::for_mesh("demo").with_tag("kuma.io/service", "db");
		assert!(check_binding(&token, &web_dataplane(), TagBinding::Superset).is_err());
	}

	#[test]
	fn tags_absent_from_token_are_unconstrained() {
		let token = DataplaneIdentity::for_mesh("demo").with_tag("version", "v1");
		assert!(check_binding(&token, &web_dataplane(), TagBinding::Exact).is_ok());
	}

	#[test]
	fn tag_missing_on_proxy_is_rejected() {
		let token = DataplaneIdentity::for_mesh("demo").with_tag("zone", "east");
		assert!(check_binding(&token, &web_dataplane(), TagBinding::Superset).is_err());
	}

	#[test]
	fn tag_without_values_still_binds() {
		let mut tags = MultiValueTagSet::new();
		tags.insert_all("zone", Vec::<String>::new());
		let token = DataplaneIdentity::for_mesh("demo").with_tags(tags);

		for binding in [TagBinding::Exact, TagBinding::Superset] {
			let err = check_binding(&token, &web_dataplane(), binding).unwrap_err();
			assert!(matches!(err, AuthenticationError::TagMismatch { ref tag, .. } if tag == "zone"));
		}

		let in_zone = web_dataplane().with_tag("zone", "east");
		assert!(check_binding(&token, &in_zone, TagBinding::Superset).is_ok());
		assert!(check_binding(&token, &in_zone, TagBinding::Exact).is_err());
	}

	#[test]
	fn invalid_token_surfaces_token_error() {
		let err = authenticator()
			.authenticate(&Credential::from("garbage"), &web_dataplane())
			.unwrap_err();
		assert!(matches!(err, AuthenticationError::Token(TokenError::Parse(_))));
	}
}
