// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::signing_key::KeySourceError;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

pub type TokenResult<T> = std::result::Result<T, TokenError>;

/// Errors from issuing or validating dataplane tokens.
#[derive(Debug, Error)]
pub enum TokenError {
	/// The key source returned an empty key.
	#[error("signing key not found")]
	SigningKeyNotFound,

	/// The key source itself failed.
	#[error("could not fetch signing key: {0}")]
	KeySource(#[source] KeySourceError),

	#[error("could not sign token: {0}")]
	Signing(#[source] JwtError),

	/// Malformed token, bad encoding or signature mismatch.
	#[error("could not parse token: {0}")]
	Parse(#[source] JwtError),

	/// Well-formed and signed, but rejected by claim or header checks.
	#[error("token is not valid: {0}")]
	InvalidToken(#[source] JwtError),
}

impl TokenError {
	/// True when no usable key could be obtained, which is a server-side fault.
	pub fn is_key_unavailable(&self) -> bool {
		matches!(self, Self::SigningKeyNotFound | Self::KeySource(_))
	}

	/// True when the presented credential was rejected.
	pub fn is_rejected_credential(&self) -> bool {
		matches!(self, Self::Parse(_) | Self::InvalidToken(_))
	}

	/// A short reason that is safe to return to callers.
	pub fn reason(&self) -> &'static str {
		match self {
			Self::SigningKeyNotFound => "signing key not found",
			Self::KeySource(_) => "signing key unavailable",
			Self::Signing(_) => "signing failed",
			Self::Parse(_) => "could not parse token",
			Self::InvalidToken(_) => "token is not valid",
		}
	}

	pub(crate) fn from_decode(err: JwtError) -> Self {
		match err.kind() {
			ErrorKind::InvalidAlgorithm
			| ErrorKind::ExpiredSignature
			| ErrorKind::ImmatureSignature
			| ErrorKind::InvalidIssuer
			| ErrorKind::InvalidAudience
			| ErrorKind::InvalidSubject
			| ErrorKind::MissingRequiredClaim(_) => Self::InvalidToken(err),
			_ => Self::Parse(err),
		}
	}
}
