// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dataplane token routes.
//!
//! Endpoints:
//! - `POST /tokens` - Issue a token; the body of the response is the raw token
//! - `POST /tokens/validate` - Validate a raw token and return its identity

use axum::{
	extract::{rejection::JsonRejection, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	routing::post,
	Json, Router,
};
use meshtrust_tokens::{Credential, DataplaneIdentity, DataplaneTokenIssuer, MultiValueTagSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::error::{ApiError, TokenAction};

/// Tag values as a JSON list or a comma-separated string. Values are trimmed
/// and blank values dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValues {
	List(Vec<String>),
	Joined(String),
}

impl TagValues {
	pub fn into_values(self) -> Vec<String> {
		let values: Vec<&str> = match &self {
			TagValues::List(values) => values.iter().map(String::as_str).collect(),
			TagValues::Joined(joined) => joined.split(',').collect(),
		};
		values
			.into_iter()
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(String::from)
			.collect()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataplaneTokenRequest {
	/// Empty or absent issues a token valid for any dataplane of the mesh.
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub mesh: String,
	#[serde(default)]
	pub tags: BTreeMap<String, TagValues>,
}

impl DataplaneTokenRequest {
	/// Fails when a tag ends up with no values.
	pub fn into_identity(self) -> Result<DataplaneIdentity, ApiError> {
		let mut tags = MultiValueTagSet::new();
		for (tag, values) in self.tags {
			let values = values.into_values();
			if values.is_empty() {
				return Err(ApiError::BadRequest(format!(
					"tags.{tag}: must have at least one value"
				)));
			}
			tags.insert_all(tag, values);
		}
		Ok(DataplaneIdentity {
			name: self.name,
			mesh: self.mesh,
			tags,
		})
	}
}

pub fn router(issuer: DataplaneTokenIssuer) -> Router {
	Router::new()
		.route("/tokens", post(generate_token))
		.route("/tokens/validate", post(validate_token))
		.with_state(issuer)
}

#[instrument(skip(issuer, payload))]
pub async fn generate_token(
	State(issuer): State<DataplaneTokenIssuer>,
	payload: Result<Json<DataplaneTokenRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
	let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
	if request.mesh.is_empty() {
		return Err(ApiError::BadRequest("mesh: cannot be empty".to_string()));
	}

	let identity = request.into_identity()?;
	let credential = issuer.generate(&identity).map_err(|source| ApiError::Token {
		action: TokenAction::Generate,
		source,
	})?;

	info!(mesh = %identity.mesh, name = %identity.name, "issued dataplane token");
	Ok((
		StatusCode::OK,
		[(header::CONTENT_TYPE, "text/plain")],
		credential.into_string(),
	)
		.into_response())
}

#[instrument(skip_all)]
pub async fn validate_token(
	State(issuer): State<DataplaneTokenIssuer>,
	body: String,
) -> Result<Json<DataplaneIdentity>, ApiError> {
	let credential = Credential::new(body.trim());
	let identity = issuer
		.validate(&credential)
		.map_err(|source| ApiError::Token {
			action: TokenAction::Validate,
			source,
		})?;
	Ok(Json(identity))
}
