// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The identity a dataplane token asserts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tag name to the set of values declared for it.
///
/// A tag may carry several values (a proxy serving two services has two
/// `kuma.io/service` values). Value order and duplicates carry no meaning, so
/// values are kept as a sorted set. A tag present with zero values is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiValueTagSet(BTreeMap<String, BTreeSet<String>>);

impl MultiValueTagSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `value` to the values of `name`.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.entry(name.into()).or_default().insert(value.into());
	}

	/// Replaces the values of `name`.
	pub fn insert_all<I, V>(&mut self, name: impl Into<String>, values: I)
	where
		I: IntoIterator<Item = V>,
		V: Into<String>,
	{
		self.0
			.insert(name.into(), values.into_iter().map(Into::into).collect());
	}

	pub fn contains_tag(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Values of `name`, sorted. Empty when the tag is absent.
	pub fn values(&self, name: &str) -> Vec<&str> {
		self
			.0
			.get(name)
			.map(|values| values.iter().map(String::as_str).collect())
			.unwrap_or_default()
	}

	pub(crate) fn value_set(&self, name: &str) -> Option<&BTreeSet<String>> {
		self.0.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
		self.0.iter().map(|(name, values)| (name.as_str(), values))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Tag name to sorted value list, the shape carried inside a token.
	pub fn to_sequences(&self) -> BTreeMap<String, Vec<String>> {
		self
			.0
			.iter()
			.map(|(name, values)| (name.clone(), values.iter().cloned().collect()))
			.collect()
	}
}

impl<K, V> FromIterator<(K, V)> for MultiValueTagSet
where
	K: Into<String>,
	V: IntoIterator,
	V::Item: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut tags = Self::new();
		for (name, values) in iter {
			let name = name.into();
			let entry = tags.0.entry(name).or_default();
			entry.extend(values.into_iter().map(Into::into));
		}
		tags
	}
}

/// Who a token says its bearer is.
///
/// An empty `name` means the token is valid for any dataplane in the mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataplaneIdentity {
	#[serde(default)]
	pub name: String,
	pub mesh: String,
	#[serde(default)]
	pub tags: MultiValueTagSet,
}

impl DataplaneIdentity {
	/// An identity valid for any dataplane of `mesh`.
	pub fn for_mesh(mesh: impl Into<String>) -> Self {
		Self {
			name: String::new(),
			mesh: mesh.into(),
			tags: MultiValueTagSet::new(),
		}
	}

	pub fn for_dataplane(name: impl Into<String>, mesh: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			mesh: mesh.into(),
			tags: MultiValueTagSet::new(),
		}
	}

	pub fn with_tags(mut self, tags: MultiValueTagSet) -> Self {
		self.tags = tags;
		self
	}

	pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(name, value);
		self
	}

	pub fn is_bound_to_name(&self) -> bool {
		!self.name.is_empty()
	}
}
