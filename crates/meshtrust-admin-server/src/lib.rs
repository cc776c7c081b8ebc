// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Meshtrust admin server.
//!
//! Serves the admin API (mesh secrets, dataplane tokens, metrics) on a
//! loopback listener and, optionally, on a public listener that requires
//! mutual TLS.

pub mod api;
pub mod client;
pub mod error;
pub mod exposure;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod signing_key;
pub mod store;
pub mod tls;

pub use api::{setup_api, AdminApi};
pub use client::{ClientError, DataplaneTokenClient, DataplaneTokenClientBuilder};
pub use error::{AdminServerError, ApiError, ErrorResponse};
pub use exposure::{dataplane_token_issuer, TokenEndpointExposure};
pub use metrics::AdminServerMetrics;
pub use routes::tokens::DataplaneTokenRequest;
pub use server::{AdminServer, RunningAdminServer, TrustZone};
pub use signing_key::{bootstrap_signing_key, signing_key_source, SecretStoreKeySource};
pub use store::{MemorySecretStore, MeshSecret, SecretKey, SecretStore, StoreError};
