//! Flat, order-preserving query parameters and their URL search string codec.
//!
//! Arrays are written as repeated keys (`key=v1&key=v2`) and [`Value::Null`] entries are skipped.
//! [`decode`] only ever produces strings, so numeric fields have to be coerced by the caller.

use core::{iter::FromIterator, slice};
use hashbrown::HashSet;
use url::form_urlencoded;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	/// Skipped when encoding.
	Null,
	Scalar(String),
	/// Order-significant. An empty list encodes to nothing.
	List(Vec<String>),
}
impl Value {
	/// All values as a slice. [`Value::Null`] yields an empty one.
	#[must_use]
	pub fn values(&self) -> &[String] {
		match self {
			Value::Null => &[],
			Value::Scalar(scalar) => slice::from_ref(scalar),
			Value::List(list) => list,
		}
	}

	/// Converts into a list, wrapping a scalar.
	#[must_use]
	pub fn into_list(self) -> Vec<String> {
		match self {
			Value::Null => Vec::new(),
			Value::Scalar(scalar) => vec![scalar],
			Value::List(list) => list,
		}
	}

	#[must_use]
	pub fn as_scalar(&self) -> Option<&str> {
		match self {
			Value::Scalar(scalar) => Some(scalar),
			Value::Null | Value::List(_) => None,
		}
	}

	/// Whether this value carries anything a search could use.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values().iter().all(String::is_empty)
	}
}
impl From<&str> for Value {
	fn from(scalar: &str) -> Self {
		Value::Scalar(scalar.to_owned())
	}
}
impl From<String> for Value {
	fn from(scalar: String) -> Self {
		Value::Scalar(scalar)
	}
}
impl From<u32> for Value {
	fn from(number: u32) -> Self {
		Value::Scalar(number.to_string())
	}
}
impl From<Vec<String>> for Value {
	fn from(list: Vec<String>) -> Self {
		Value::List(list)
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

/// A flat key → [`Value`] mapping that keeps insertion order.
///
/// Overwriting an existing key keeps its original position, so the serialized form stays stable while values change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, Value)>);
impl Params {
	#[must_use]
	pub fn new() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	#[must_use]
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Returns the replaced value, if any.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		let key = key.into();
		let value = value.into();
		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => Some(core::mem::replace(slot, value)),
			None => {
				self.0.push((key, value));
				None
			}
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let index = self.0.iter().position(|(k, _)| k == key)?;
		Some(self.0.remove(index).1)
	}

	/// Inserts every entry of `other`, overwriting in place.
	pub fn merge(&mut self, other: Params) {
		for (key, value) in other {
			self.insert(key, value);
		}
	}

	/// A copy without the given keys.
	#[must_use]
	pub fn without(&self, keys: &HashSet<String>) -> Self {
		self.0.iter().filter(|(k, _)| !keys.contains(k)).cloned().collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(k, _)| k.as_str())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Params::new();
		for (key, value) in iter {
			params.insert(key, value);
		}
		params
	}
}
impl IntoIterator for Params {
	type Item = (String, Value);
	type IntoIter = std::vec::IntoIter<(String, Value)>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Serializes `params` without a leading `?`.
#[must_use]
pub fn encode(params: &Params) -> String {
	let mut serializer = form_urlencoded::Serializer::new(String::new());
	for (key, value) in params.iter() {
		for value in value.values() {
			serializer.append_pair(key, value);
		}
	}
	serializer.finish()
}

/// Parses a search string, with or without its leading `?`.
///
/// Keys that appear more than once become a [`Value::List`] in order of appearance, all others a [`Value::Scalar`].
#[must_use]
pub fn decode(search: &str) -> Params {
	let search = search.strip_prefix('?').unwrap_or(search);
	let mut params = Params::new();
	for (key, value) in form_urlencoded::parse(search.as_bytes()) {
		if key.is_empty() {
			continue;
		}
		let value = value.into_owned();
		match params.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot @ Value::Scalar(_))) => {
				if let Value::Scalar(first) = core::mem::replace(slot, Value::Null) {
					*slot = Value::List(vec![first, value]);
				}
			}
			Some((_, Value::List(list))) => list.push(value),
			Some((_, slot @ Value::Null)) => *slot = Value::Scalar(value),
			None => params.0.push((key.into_owned(), Value::Scalar(value))),
		}
	}
	params
}
