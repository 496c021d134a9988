//! Permission sets granted to the authenticated user.

// std
use std::{collections::BTreeSet, slice::Iter};
// crates.io
use serde::{Deserializer, Serializer, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Set of permission labels (e.g. `trade`, `view_portfolios`).
///
/// Entries are deduplicated and sorted so equality stays independent of the order the backend
/// lists them in. Labels are otherwise kept exactly as sent: the pipeline never interprets
/// permissions, it only carries them with the credential.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(Arc<[String]>);
impl PermissionSet {
	/// Creates a deduplicated permission set from any iterator.
	pub fn new<I, S>(permissions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let set = permissions.into_iter().map(Into::into).collect::<BTreeSet<String>>();

		Self(Arc::from(set.into_iter().collect::<Vec<_>>()))
	}

	/// Number of distinct permissions.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no permissions are granted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set grants the provided permission.
	pub fn contains(&self, permission: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(permission)).is_ok()
	}

	/// Iterator over the permissions in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}
}
impl Debug for PermissionSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PermissionSet").field(&self.0).finish()
	}
}

/// Iterator over permission strings.
pub struct PermissionIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for PermissionIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a PermissionSet {
	type IntoIter = PermissionIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		PermissionIter { inner: self.0.iter() }
	}
}
impl Serialize for PermissionSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for permission in self.0.iter() {
			seq.serialize_element(permission)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for PermissionSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		<Vec<String>>::deserialize(deserializer).map(PermissionSet::new)
	}
}
