use crate::codec::Params;
use core::fmt::{self, Debug, Formatter};
use serde::Deserialize;

/// Built-in validation policies, selectable from [`Options`](`crate::Options`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Validation {
	/// Every query may be requested.
	Always,
	/// The named key must hold a non-empty value, e.g. `keywords`.
	NonEmpty(String),
}
impl Default for Validation {
	fn default() -> Self {
		Validation::Always
	}
}

/// Decides whether a query is complete enough to be sent.
///
/// Pure and synchronous. It sees the full request query: parameters, facet selections and pagination.
pub struct ValidationGate(Box<dyn Fn(&Params) -> bool>);
impl ValidationGate {
	pub fn new(predicate: impl Fn(&Params) -> bool + 'static) -> Self {
		Self(Box::new(predicate))
	}

	#[must_use]
	pub fn always() -> Self {
		Self::new(|_| true)
	}

	pub fn non_empty(key: impl Into<String>) -> Self {
		let key = key.into();
		Self::new(move |query| query.get(&key).map_or(false, |value| !value.is_empty()))
	}

	#[must_use]
	pub fn is_valid(&self, query: &Params) -> bool {
		(self.0)(query)
	}
}
impl From<Validation> for ValidationGate {
	fn from(validation: Validation) -> Self {
		match validation {
			Validation::Always => ValidationGate::always(),
			Validation::NonEmpty(key) => ValidationGate::non_empty(key),
		}
	}
}
impl Debug for ValidationGate {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ValidationGate").finish()
	}
}
