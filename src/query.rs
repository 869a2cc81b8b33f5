//! The user- and URL-editable half of a list's state.

use crate::{
	codec::{Params, Value},
	result::FacetDescriptor,
};
use core::iter::FromIterator;
use hashbrown::HashSet;
use tracing::{trace, warn};

pub(crate) const LIMIT_KEY: &str = "limit";
pub(crate) const OFFSET_KEY: &str = "offset";

/// Which slice of the result set to request next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
	/// Always positive.
	pub limit: u32,
	pub offset: u32,
}
impl Cursor {
	#[must_use]
	pub fn first_page(limit: u32) -> Self {
		Self { limit, offset: 0 }
	}

	/// One past the last requested index.
	#[must_use]
	pub fn end(self) -> u32 {
		self.offset.saturating_add(self.limit)
	}
}

/// Per-alias facet selections, in insertion order.
///
/// Selections are duplicate-free but order-significant, which keeps the URL mirror and UI ordering stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets(Vec<(String, Vec<String>)>);
impl Facets {
	#[must_use]
	pub fn new() -> Self {
		Self(Vec::new())
	}

	#[must_use]
	pub fn get(&self, alias: &str) -> Option<&[String]> {
		self.0.iter().find(|(a, _)| a == alias).map(|(_, selection)| selection.as_slice())
	}

	#[must_use]
	pub fn contains_alias(&self, alias: &str) -> bool {
		self.get(alias).is_some()
	}

	/// Replaces a selection, dropping duplicates but keeping first occurrences in place.
	pub fn set(&mut self, alias: impl Into<String>, values: impl IntoIterator<Item = String>) {
		let mut selection: Vec<String> = Vec::new();
		for value in values {
			if !selection.contains(&value) {
				selection.push(value);
			}
		}
		*self.entry(alias.into()) = selection;
	}

	/// Removes `value` if selected, otherwise appends it.
	///
	/// Returns whether `value` is selected afterwards.
	pub fn toggle(&mut self, alias: impl Into<String>, value: impl ToString) -> bool {
		let value = value.to_string();
		let selection = self.entry(alias.into());
		match selection.iter().position(|selected| *selected == value) {
			Some(index) => {
				selection.remove(index);
				false
			}
			None => {
				selection.push(value);
				true
			}
		}
	}

	/// "Seed if absent": adds an empty selection for every advertised alias not present yet, leaving live selections alone.
	///
	/// Aliases that are neither advertised nor selected are dropped afterwards.
	pub fn seed(&mut self, descriptors: &[FacetDescriptor]) {
		for descriptor in descriptors {
			if !self.contains_alias(&descriptor.alias) {
				trace!(alias = descriptor.alias.as_str(), "Seeding facet.");
				self.0.push((descriptor.alias.clone(), Vec::new()));
			}
		}
		self.0.retain(|(alias, selection)| !selection.is_empty() || descriptors.iter().any(|d| d.alias == *alias));
	}

	/// Empties every selection, keeping the key-set.
	pub fn clear_selections(&mut self) {
		for (_, selection) in &mut self.0 {
			selection.clear();
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0.iter().map(|(alias, selection)| (alias.as_str(), selection.as_slice()))
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	fn entry(&mut self, alias: String) -> &mut Vec<String> {
		let index = match self.0.iter().position(|(a, _)| *a == alias) {
			Some(index) => index,
			None => {
				self.0.push((alias, Vec::new()));
				self.0.len() - 1
			}
		};
		&mut self.0[index].1
	}
}
impl<A: Into<String>> FromIterator<(A, Vec<String>)> for Facets {
	fn from_iter<I: IntoIterator<Item = (A, Vec<String>)>>(iter: I) -> Self {
		let mut facets = Facets::new();
		for (alias, values) in iter {
			facets.set(alias, values);
		}
		facets
	}
}

/// Host-supplied starting values, merged over the component defaults and under the URL.
#[derive(Debug, Clone, Default)]
pub struct Initial {
	pub parameters: Params,
	pub facets: Facets,
}

/// Search parameters, facet selections and the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
	parameters: Params,
	facets: Facets,
	cursor: Cursor,
	default_limit: u32,
}
impl QueryState {
	#[must_use]
	pub fn new(initial: Initial, default_limit: u32) -> Self {
		Self {
			parameters: initial.parameters,
			facets: initial.facets,
			cursor: Cursor::first_page(default_limit),
			default_limit,
		}
	}

	/// Applies a search string read from the address bar, which takes priority over everything else.
	///
	/// Keys are classified as parameters if they are already known as such or listed in `parameter_keys`,
	/// as pagination if they are `limit` or `offset`, and as facets otherwise.
	///
	/// Returns whether the URL supplied any key at all.
	pub fn apply_url(&mut self, url_params: Params, parameter_keys: &HashSet<String>) -> bool {
		let supplied = !url_params.is_empty();
		for (key, value) in url_params {
			if self.parameters.contains_key(&key) || parameter_keys.contains(&key) {
				self.parameters.insert(key, value);
			} else if key == LIMIT_KEY || key == OFFSET_KEY {
				match value.as_scalar().map(str::parse::<u32>) {
					Some(Ok(number)) if key == LIMIT_KEY && number > 0 => self.cursor.limit = number,
					Some(Ok(number)) if key == OFFSET_KEY => self.cursor.offset = number,
					_ => warn!(key = key.as_str(), ?value, "Ignoring malformed pagination value from the URL."),
				}
			} else {
				self.facets.set(key, value.into_list());
			}
		}
		supplied
	}

	#[must_use]
	pub fn parameters(&self) -> &Params {
		&self.parameters
	}

	#[must_use]
	pub fn facets(&self) -> &Facets {
		&self.facets
	}

	#[must_use]
	pub fn cursor(&self) -> Cursor {
		self.cursor
	}

	#[must_use]
	pub fn default_limit(&self) -> u32 {
		self.default_limit
	}

	pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.parameters.insert(key, value);
	}

	pub fn set_facet(&mut self, alias: impl Into<String>, values: impl IntoIterator<Item = String>) {
		self.facets.set(alias, values);
	}

	/// See [`Facets::toggle`].
	pub fn toggle_facet_value(&mut self, alias: impl Into<String>, value: impl ToString) -> bool {
		self.facets.toggle(alias, value)
	}

	pub fn seed_facets(&mut self, descriptors: &[FacetDescriptor]) {
		self.facets.seed(descriptors);
	}

	pub fn set_cursor(&mut self, cursor: Cursor) {
		self.cursor = cursor;
	}

	/// Back to the first page at the configured limit.
	pub fn reset_pagination(&mut self) {
		self.cursor = Cursor::first_page(self.default_limit);
	}

	/// Clears every facet selection and resets pagination. Search parameters are kept.
	pub fn reset(&mut self) {
		self.facets.clear_selections();
		self.reset_pagination();
	}

	/// The flat mapping sent to the server: parameters, then facets, then `limit` and `offset`.
	#[must_use]
	pub fn request_params(&self) -> Params {
		self.request_params_at(self.cursor)
	}

	#[must_use]
	pub fn request_params_at(&self, cursor: Cursor) -> Params {
		let mut params = self.parameters.clone();
		for (alias, selection) in self.facets.iter() {
			params.insert(alias, selection.to_vec());
		}
		params.insert(LIMIT_KEY, cursor.limit);
		params.insert(OFFSET_KEY, cursor.offset);
		params
	}
}

/// Reads `limit`/`offset` back out of request parameters.
#[must_use]
pub(crate) fn cursor_of(params: &Params) -> Option<Cursor> {
	let number = |key| params.get(key)?.as_scalar()?.parse::<u32>().ok();
	Some(Cursor {
		limit: number(LIMIT_KEY).filter(|limit| *limit > 0)?,
		offset: number(OFFSET_KEY)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::decode;

	fn descriptor(alias: &str) -> FacetDescriptor {
		FacetDescriptor { alias: alias.to_owned(), metadata: Default::default() }
	}

	#[test]
	fn toggling_preserves_order() {
		let mut facets = Facets::new();
		assert!(facets.toggle("color", "red"));
		assert!(facets.toggle("color", "green"));
		assert!(facets.toggle("color", "blue"));
		assert!(!facets.toggle("color", "green"));
		assert_eq!(facets.get("color"), Some(&["red".to_owned(), "blue".to_owned()][..]));
	}

	#[test]
	fn toggling_coerces_to_string() {
		let mut facets = Facets::new();
		facets.toggle("year", 2021);
		assert!(!facets.toggle("year", "2021"));
		assert_eq!(facets.get("year"), Some(&[][..]));
	}

	#[test]
	fn seeding_never_overwrites_a_selection() {
		let mut facets = Facets::new();
		facets.toggle("color", "red");
		facets.seed(&[descriptor("color"), descriptor("size")]);
		assert_eq!(facets.get("color"), Some(&["red".to_owned()][..]));
		assert_eq!(facets.get("size"), Some(&[][..]));
	}

	#[test]
	fn seeding_prunes_unadvertised_empty_aliases() {
		let mut facets: Facets = vec![("gone", Vec::new()), ("kept", vec!["x".to_owned()])].into_iter().collect();
		facets.seed(&[descriptor("color")]);
		assert!(!facets.contains_alias("gone"));
		assert!(facets.contains_alias("kept"));
		assert!(facets.contains_alias("color"));
	}

	#[test]
	fn url_classification() {
		let initial = Initial {
			parameters: vec![("keywords", "")].into_iter().collect(),
			facets: Facets::new(),
		};
		let mut query = QueryState::new(initial, 10);
		let parameter_keys = ["sort".to_owned()].iter().cloned().collect();

		let supplied = query.apply_url(decode("keywords=shoe&sort=price&offset=20&limit=x&color=red&color=blue&size=m"), &parameter_keys);

		assert!(supplied);
		assert_eq!(query.parameters().get("keywords"), Some(&Value::from("shoe")));
		assert_eq!(query.parameters().get("sort"), Some(&Value::from("price")));
		assert_eq!(query.cursor(), Cursor { limit: 10, offset: 20 });
		assert_eq!(query.facets().get("color"), Some(&["red".to_owned(), "blue".to_owned()][..]));
		assert_eq!(query.facets().get("size"), Some(&["m".to_owned()][..]));
	}

	#[test]
	fn reset_keeps_parameters() {
		let mut query = QueryState::new(Initial::default(), 10);
		query.set_parameter("keywords", "a");
		query.toggle_facet_value("color", "red");
		query.set_cursor(Cursor { limit: 30, offset: 20 });

		query.reset();

		assert_eq!(query.parameters().get("keywords"), Some(&Value::from("a")));
		assert_eq!(query.facets().get("color"), Some(&[][..]));
		assert_eq!(query.cursor(), Cursor::first_page(10));
	}

	#[test]
	fn request_params_order() {
		let mut query = QueryState::new(Initial::default(), 10);
		query.set_parameter("keywords", "a");
		query.toggle_facet_value("color", "red");
		let params = query.request_params();
		assert_eq!(params.keys().collect::<Vec<_>>(), ["keywords", "color", "limit", "offset"]);
		assert_eq!(cursor_of(&params), Some(Cursor::first_page(10)));
	}
}
