// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control plane deployment settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of this control plane in a multi-zone deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	#[default]
	Standalone,
	/// A zone control plane synchronised from a global one.
	Remote,
	Global,
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Mode::Standalone => write!(f, "standalone"),
			Mode::Remote => write!(f, "remote"),
			Mode::Global => write!(f, "global"),
		}
	}
}

impl FromStr for Mode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"standalone" => Ok(Mode::Standalone),
			"remote" => Ok(Mode::Remote),
			"global" => Ok(Mode::Global),
			other => Err(format!(
				"unknown mode '{other}', expected standalone, remote or global"
			)),
		}
	}
}

/// Platform the control plane runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	#[default]
	Universal,
	Kubernetes,
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Environment::Universal => write!(f, "universal"),
			Environment::Kubernetes => write!(f, "kubernetes"),
		}
	}
}

impl FromStr for Environment {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"universal" => Ok(Environment::Universal),
			"kubernetes" => Ok(Environment::Kubernetes),
			other => Err(format!(
				"unknown environment '{other}', expected universal or kubernetes"
			)),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPlaneConfig {
	pub mode: Mode,
	pub environment: Environment,
	/// Mutating admin endpoints are not registered when set.
	pub read_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ControlPlaneConfigLayer {
	#[serde(default)]
	pub mode: Option<Mode>,
	#[serde(default)]
	pub environment: Option<Environment>,
	#[serde(default)]
	pub read_only: Option<bool>,
}

impl ControlPlaneConfigLayer {
	pub fn merge(&mut self, other: ControlPlaneConfigLayer) {
		if other.mode.is_some() {
			self.mode = other.mode;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.read_only.is_some() {
			self.read_only = other.read_only;
		}
	}

	pub fn finalize(self) -> ControlPlaneConfig {
		ControlPlaneConfig {
			mode: self.mode.unwrap_or_default(),
			environment: self.environment.unwrap_or_default(),
			read_only: self.read_only.unwrap_or(false),
		}
	}
}
