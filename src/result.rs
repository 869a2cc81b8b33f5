//! Server responses and the last-known result set.

use crate::query::Cursor;
use hashbrown::HashMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as Json};
use std::convert::TryFrom;

/// A server-advertised filter dimension. Only [`alias`](`FacetDescriptor::alias`) is interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacetDescriptor {
	pub alias: String,
	/// Option metadata, passed through untouched.
	#[serde(flatten)]
	pub metadata: Map<String, Json>,
}

/// Pagination as reported by the server.
///
/// Every field is lenient: a missing or malformed number reads as [`None`].
/// `total` may change between requests if the data set is written to concurrently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
	#[serde(default, deserialize_with = "lenient_count")]
	pub limit: Option<u32>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub offset: Option<u32>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub total: Option<u32>,
}
impl PageInfo {
	/// Fills in missing `limit`/`offset` from what was requested.
	#[must_use]
	pub fn or_requested(self, requested: Cursor) -> Self {
		Self {
			limit: self.limit.filter(|limit| *limit > 0).or(Some(requested.limit)),
			offset: self.offset.or(Some(requested.offset)),
			total: self.total,
		}
	}
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	Ok(match Json::deserialize(deserializer)? {
		Json::Number(number) => number
			.as_u64()
			.or_else(|| number.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
			.and_then(|n| u32::try_from(n).ok()),
		Json::String(string) => string.trim().parse().ok(),
		_ => None,
	})
}

/// One page of results as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResultPage<T = Json> {
	#[serde(alias = "data", default = "Vec::new")]
	pub items: Vec<T>,
	#[serde(default)]
	pub pagination: PageInfo,
	#[serde(default)]
	pub facets: Option<Vec<FacetDescriptor>>,
	#[serde(default)]
	pub meta: Option<Json>,
	#[serde(default)]
	pub misc: Option<Json>,
	/// Any other top-level keys.
	#[serde(flatten)]
	pub extra: Map<String, Json>,
}
impl<T> ResultPage<T> {
	#[must_use]
	pub fn new(items: Vec<T>, pagination: PageInfo) -> Self {
		Self {
			items,
			pagination,
			facets: None,
			meta: None,
			misc: None,
			extra: Map::new(),
		}
	}

	#[must_use]
	pub fn with_facets(mut self, facets: Vec<FacetDescriptor>) -> Self {
		self.facets = Some(facets);
		self
	}
}

/// The last-known server result. Only ever replaced or extended by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultState<T = Json> {
	items: Vec<T>,
	/// Sparse, keyed by 0-based page index.
	pages: HashMap<usize, Vec<T>>,
	facets: Vec<FacetDescriptor>,
	pagination: PageInfo,
	meta: Option<Json>,
	misc: Option<Json>,
	extra: Map<String, Json>,
}
impl<T> Default for ResultState<T> {
	fn default() -> Self {
		Self {
			items: Vec::new(),
			pages: HashMap::new(),
			facets: Vec::new(),
			pagination: PageInfo::default(),
			meta: None,
			misc: None,
			extra: Map::new(),
		}
	}
}
impl<T: Clone> ResultState<T> {
	/// Starts a fresh result set. The page cache restarts with only `page_index` filled.
	pub fn replace(&mut self, items: Vec<T>, page_index: usize) {
		self.pages.clear();
		self.insert_page(page_index, items.clone());
		self.items = items;
	}

	/// Prefix-preserving concatenation.
	pub fn append(&mut self, items: Vec<T>) {
		self.items.extend(items);
	}

	/// Stores a page at its index, leaving unfetched pages before it as holes.
	pub fn insert_page(&mut self, page_index: usize, items: Vec<T>) {
		self.pages.insert(page_index, items);
	}
}
impl<T> ResultState<T> {
	#[must_use]
	pub fn items(&self) -> &[T] {
		&self.items
	}

	/// The cached page at a 0-based index.
	#[must_use]
	pub fn page(&self, page_index: usize) -> Option<&[T]> {
		self.pages.get(&page_index).map(Vec::as_slice)
	}

	#[must_use]
	pub fn is_page_cached(&self, page_index: usize) -> bool {
		self.page(page_index).is_some()
	}

	#[must_use]
	pub fn facets(&self) -> &[FacetDescriptor] {
		&self.facets
	}

	#[must_use]
	pub fn pagination(&self) -> PageInfo {
		self.pagination
	}

	#[must_use]
	pub fn meta(&self) -> Option<&Json> {
		self.meta.as_ref()
	}

	#[must_use]
	pub fn misc(&self) -> Option<&Json> {
		self.misc.as_ref()
	}

	/// Unrecognized top-level response keys of the latest reconciled page.
	#[must_use]
	pub fn extra(&self) -> &Map<String, Json> {
		&self.extra
	}

	pub fn set_facets(&mut self, facets: Vec<FacetDescriptor>) {
		self.facets = facets;
	}

	pub fn set_pagination(&mut self, pagination: PageInfo) {
		self.pagination = pagination;
	}

	pub fn set_pass_through(&mut self, meta: Option<Json>, misc: Option<Json>, extra: Map<String, Json>) {
		self.meta = meta;
		self.misc = misc;
		self.extra = extra;
	}

	/// Forgets items, cached pages and pagination. Facet descriptors are kept for the UI.
	pub fn clear(&mut self) {
		self.items.clear();
		self.pages.clear();
		self.pagination = PageInfo::default();
	}

	/// One past the last index covered so far.
	#[must_use]
	pub fn limit_end(&self) -> Option<u32> {
		Some(self.pagination.offset?.saturating_add(self.pagination.limit?))
	}

	/// Always `false` while the total is unknown.
	#[must_use]
	pub fn can_fetch_more(&self) -> bool {
		match (self.limit_end(), self.pagination.total) {
			(Some(end), Some(total)) => end < total,
			_ => false,
		}
	}

	/// How many items the next regular "load more" would add.
	#[must_use]
	pub fn items_left(&self) -> u32 {
		match (self.limit_end(), self.pagination.limit, self.pagination.total) {
			(Some(end), Some(limit), Some(total)) => total.saturating_sub(end).min(limit),
			_ => 0,
		}
	}
}
