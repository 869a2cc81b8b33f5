//! Keeps the address bar's search string a mirror of the last committed query.

use crate::codec::{decode, encode, Params};
use hashbrown::HashSet;
use std::{cell::RefCell, rc::Rc};
use tracing::trace;

/// Access to the current page URL's search string. May be absent (server-side rendering).
pub trait Location {
	/// The current search string, with or without leading `?`. [`None`] where there is no address bar.
	fn search(&self) -> Option<String>;

	/// Replaces the current history entry's search string in place. `search` has no leading `?`.
	fn replace_search(&mut self, search: &str);
}

/// No address bar at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;
impl Location for Detached {
	fn search(&self) -> Option<String> {
		None
	}

	fn replace_search(&mut self, _: &str) {}
}

/// An in-memory address bar. Clones share the same search string.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation(Rc<RefCell<String>>);
impl MemoryLocation {
	pub fn new(search: impl Into<String>) -> Self {
		Self(Rc::new(RefCell::new(search.into())))
	}

	/// The current search string, without leading `?`.
	#[must_use]
	pub fn current(&self) -> String {
		self.0.borrow().clone()
	}
}
impl Location for MemoryLocation {
	fn search(&self) -> Option<String> {
		Some(self.current())
	}

	fn replace_search(&mut self, search: &str) {
		*self.0.borrow_mut() = search.to_owned();
	}
}

/// Reads the query on mount and commits the query actually used after each reconciled fetch.
pub struct UrlMirror {
	location: Box<dyn Location>,
	omit: HashSet<String>,
}
impl UrlMirror {
	/// `omit` keys are never written to the address bar.
	pub fn new(location: Box<dyn Location>, omit: impl IntoIterator<Item = String>) -> Self {
		Self {
			location,
			omit: omit.into_iter().collect(),
		}
	}

	/// Empty where there is no address bar.
	#[must_use]
	pub fn read(&self) -> Params {
		self.location.search().map_or_else(Params::new, |search| decode(&search))
	}

	pub fn commit(&mut self, params: &Params) {
		let search = encode(&params.without(&self.omit));
		trace!(search = search.as_str(), "Committing query to the address bar.");
		self.location.replace_search(&search);
	}

	/// Mirrors "no query".
	pub fn clear(&mut self) {
		self.location.replace_search("");
	}
}
