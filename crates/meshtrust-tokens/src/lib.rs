// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dataplane identity tokens.
//!
//! A dataplane token is a compact HS256 JWT binding a proxy to a name, a mesh
//! and a set of tags. The control plane issues tokens through
//! [`DataplaneTokenIssuer`] and checks them again when a proxy connects.
//!
//! The signing key is never cached: every issue and validate call asks the
//! configured [`SigningKeySource`] for the current key, so a rotated key takes
//! effect on the next call.
//!
//! # Example
//!
//! ```
//! use meshtrust_tokens::{DataplaneIdentity, DataplaneTokenIssuer, SigningKey};
//!
//! let issuer = DataplaneTokenIssuer::from_fn(|| Ok(SigningKey::from("k1")));
//! let identity = DataplaneIdentity::for_dataplane("web-01", "demo").with_tag("kuma.io/service", "web");
//!
//! let credential = issuer.generate(&identity).unwrap();
//! assert_eq!(issuer.validate(&credential).unwrap(), identity);
//! ```

pub mod authenticator;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod signing_key;

pub use authenticator::{check_binding, AuthenticationError, DataplaneAuthenticator, TagBinding};
pub use error::{TokenError, TokenResult};
pub use identity::{DataplaneIdentity, MultiValueTagSet};
pub use issuer::{Credential, DataplaneTokenIssuer};
pub use signing_key::{FileKeySource, KeySourceError, SigningKey, SigningKeySource};
