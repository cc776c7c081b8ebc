// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mesh secret routes.
//!
//! Endpoints:
//! - `GET /meshes/{mesh}/secrets` - List the secrets of a mesh
//! - `GET /meshes/{mesh}/secrets/{name}` - Fetch a secret
//! - `PUT /meshes/{mesh}/secrets/{name}` - Create or update a secret
//! - `DELETE /meshes/{mesh}/secrets/{name}` - Delete a secret
//!
//! The mutating routes are not registered on a read-only control plane.

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	routing::get,
	Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::store::{MeshSecret, SecretKey, SecretStore, UpsertOutcome};

pub const SECRET_TYPE: &str = "Secret";

/// Secret as exchanged over the API. `data` is standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretResource {
	#[serde(rename = "type")]
	pub kind: String,
	pub mesh: String,
	pub name: String,
	pub data: String,
}

impl From<MeshSecret> for SecretResource {
	fn from(secret: MeshSecret) -> Self {
		Self {
			kind: SECRET_TYPE.to_string(),
			data: STANDARD.encode(&secret.data),
			mesh: secret.key.mesh,
			name: secret.key.name,
		}
	}
}

/// Body of `PUT`. `type`, `mesh` and `name` may be omitted; when present they
/// must agree with the path.
#[derive(Debug, Deserialize)]
pub struct SecretRequest {
	#[serde(rename = "type", default)]
	pub kind: Option<String>,
	#[serde(default)]
	pub mesh: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
	pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SecretList {
	pub items: Vec<SecretResource>,
	pub total: usize,
}

pub fn router(store: Arc<dyn SecretStore>, read_only: bool) -> Router {
	let item = if read_only {
		get(get_secret)
	} else {
		get(get_secret).put(upsert_secret).delete(delete_secret)
	};

	Router::new()
		.route("/meshes/{mesh}/secrets", get(list_secrets))
		.route("/meshes/{mesh}/secrets/{name}", item)
		.with_state(store)
}

#[instrument(skip(store), fields(mesh = %mesh))]
pub async fn list_secrets(
	State(store): State<Arc<dyn SecretStore>>,
	Path(mesh): Path<String>,
) -> Result<Json<SecretList>, ApiError> {
	let items: Vec<SecretResource> = store
		.list(&mesh)?
		.into_iter()
		.map(SecretResource::from)
		.collect();
	Ok(Json(SecretList {
		total: items.len(),
		items,
	}))
}

#[instrument(skip(store), fields(mesh = %mesh, name = %name))]
pub async fn get_secret(
	State(store): State<Arc<dyn SecretStore>>,
	Path((mesh, name)): Path<(String, String)>,
) -> Result<Json<SecretResource>, ApiError> {
	let key = SecretKey::new(mesh, name);
	match store.get(&key)? {
		Some(secret) => Ok(Json(secret.into())),
		None => Err(ApiError::NotFound(format!("secret {key}"))),
	}
}

#[instrument(skip(store, payload), fields(mesh = %mesh, name = %name))]
pub async fn upsert_secret(
	State(store): State<Arc<dyn SecretStore>>,
	Path((mesh, name)): Path<(String, String)>,
	payload: Result<Json<SecretRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SecretResource>), ApiError> {
	let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
	let secret = secret_from_request(SecretKey::new(mesh, name), request)?;

	let resource = SecretResource::from(secret.clone());
	let status = match store.upsert(secret)? {
		UpsertOutcome::Created => StatusCode::CREATED,
		UpsertOutcome::Updated => StatusCode::OK,
	};
	info!(status = status.as_u16(), "secret stored");
	Ok((status, Json(resource)))
}

#[instrument(skip(store), fields(mesh = %mesh, name = %name))]
pub async fn delete_secret(
	State(store): State<Arc<dyn SecretStore>>,
	Path((mesh, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
	let key = SecretKey::new(mesh, name);
	if store.delete(&key)? {
		info!("secret deleted");
		Ok(StatusCode::OK)
	} else {
		Err(ApiError::NotFound(format!("secret {key}")))
	}
}

fn secret_from_request(key: SecretKey, request: SecretRequest) -> Result<MeshSecret, ApiError> {
	if let Some(kind) = request.kind.as_deref() {
		if kind != SECRET_TYPE {
			return Err(ApiError::BadRequest(format!(
				"type: must be {SECRET_TYPE}, got {kind}"
			)));
		}
	}
	if let Some(mesh) = request.mesh.as_deref() {
		if mesh != key.mesh {
			return Err(ApiError::BadRequest(format!(
				"mesh: {mesh} does not match the path mesh {}",
				key.mesh
			)));
		}
	}
	if let Some(name) = request.name.as_deref() {
		if name != key.name {
			return Err(ApiError::BadRequest(format!(
				"name: {name} does not match the path name {}",
				key.name
			)));
		}
	}

	let data = STANDARD
		.decode(request.data.as_bytes())
		.map_err(|e| ApiError::BadRequest(format!("data: not valid base64: {e}")))?;
	Ok(MeshSecret::new(key, data))
}
