// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the admin server.

pub mod admin_server;
pub mod control_plane;
pub mod logging;
pub mod signing_key;

pub use admin_server::{
	AdminServerConfig, AdminServerConfigLayer, DataplaneTokenApiConfig, LocalListenerConfig,
	PublicListenerConfig,
};
pub use control_plane::{ControlPlaneConfig, ControlPlaneConfigLayer, Environment, Mode};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use signing_key::{SigningKeyConfig, SigningKeyConfigLayer};
