// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AdminServerConfigLayer, ControlPlaneConfigLayer, LoggingConfigLayer, SigningKeyConfigLayer,
};

/// Configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MeshtrustConfigLayer {
	#[serde(default)]
	pub admin_server: Option<AdminServerConfigLayer>,
	#[serde(default)]
	pub control_plane: Option<ControlPlaneConfigLayer>,
	#[serde(default)]
	pub signing_key: Option<SigningKeyConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl MeshtrustConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: MeshtrustConfigLayer) {
		merge_option(
			&mut self.admin_server,
			other.admin_server,
			AdminServerConfigLayer::merge,
		);
		merge_option(
			&mut self.control_plane,
			other.control_plane,
			ControlPlaneConfigLayer::merge,
		);
		merge_option(
			&mut self.signing_key,
			other.signing_key,
			SigningKeyConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
