// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use crate::server::TrustZone;
use crate::store::StoreError;
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use meshtrust_tokens::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Errors returned by admin API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("could not {action} token: {source}")]
	Token {
		action: TokenAction,
		#[source]
		source: TokenError,
	},

	#[error("Store error: {0}")]
	Store(#[from] StoreError),

	#[error("Internal error: {0}")]
	Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
	Generate,
	Validate,
}

impl fmt::Display for TokenAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenAction::Generate => write!(f, "generate"),
			TokenAction::Validate => write!(f, "validate"),
		}
	}
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl ErrorResponse {
	fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, error_response) = match &self {
			ApiError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ApiError::NotFound(what) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", format!("{what} not found")),
			),
			ApiError::Token { action, source } if source.is_rejected_credential() => {
				tracing::warn!(%action, error = %source, "dataplane token rejected");
				(
					StatusCode::UNAUTHORIZED,
					ErrorResponse::new(
						"invalid_token",
						format!("could not {action} a token: {}", source.reason()),
					),
				)
			}
			ApiError::Token { action, source } => {
				tracing::error!(%action, error = %source, "dataplane token operation failed");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new(
						"token_error",
						format!("could not {action} a token: {}", source.reason()),
					),
				)
			}
			ApiError::Store(e) => {
				tracing::error!(error = %e, "secret store error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("store_error", "A secret store error occurred"),
				)
			}
			ApiError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
		};

		(status, Json(error_response)).into_response()
	}
}

/// Errors from starting, running or stopping the admin server.
#[derive(Debug, thiserror::Error)]
pub enum AdminServerError {
	#[error("could not read client certificate directory {path}: {source}")]
	ClientCertsDir {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("could not read client certificate {path}: {source}")]
	ClientCertRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("no client certificates found in {0}")]
	NoClientCertificates(PathBuf),

	#[error("invalid TLS material in {path}: {message}")]
	TlsMaterial { path: PathBuf, message: String },

	#[error("public listener requires {0}")]
	MissingTlsSetting(&'static str),

	#[error("invalid listener interface '{0}'")]
	InvalidInterface(String),

	#[error("could not build client certificate verifier: {0}")]
	ClientVerifier(String),

	#[error("TLS configuration error: {0}")]
	Tls(#[from] rustls::Error),

	#[error("{zone} listener failed: {source}")]
	Listener {
		zone: TrustZone,
		#[source]
		source: std::io::Error,
	},

	#[error("{zone} listener task failed: {message}")]
	Task { zone: TrustZone, message: String },

	#[error("could not register metrics: {0}")]
	Metrics(#[from] prometheus::Error),

	#[error("could not prepare signing key: {0}")]
	SigningKey(#[from] StoreError),

	#[error("{}", join_errors(.0))]
	Multiple(Vec<AdminServerError>),
}

impl AdminServerError {
	/// Folds listener outcomes into one result.
	pub fn combine(mut errors: Vec<AdminServerError>) -> Result<(), AdminServerError> {
		match errors.len() {
			0 => Ok(()),
			1 => Err(errors.remove(0)),
			_ => Err(AdminServerError::Multiple(errors)),
		}
	}
}

fn join_errors(errors: &[AdminServerError]) -> String {
	errors
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}
