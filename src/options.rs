use crate::{list::RequestType, pagination::PaginationType, validation::Validation};
use core::time::Duration;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_API: &str = "/umbraco/api/site/search/";
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_DEBOUNCE_TIME: u64 = 500;

/// Host configuration, deserializable from the host's `options` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
	pub api: String,
	/// Steady-state page size.
	pub limit: u32,
	/// Fetch on mount. Forced on if the URL supplied any key.
	pub immediate: bool,
	pub live_search: bool,
	pub pagination_type: PaginationType,
	/// Live-search debounce window in milliseconds.
	pub debounce_time: u64,
	/// Keys that are sent to the server but never mirrored into the address bar.
	pub omit_in_url: Vec<String>,
	/// Keys read from the URL as search parameters even if the host didn't supply them initially.
	pub parameter_keys: Vec<String>,
	pub validation: Validation,
	/// Request types whose response never triggers the total-changed refetch.
	pub refetch_exempt: Vec<RequestType>,
}
impl Default for Options {
	fn default() -> Self {
		Self {
			api: DEFAULT_API.to_owned(),
			limit: DEFAULT_LIMIT,
			immediate: false,
			live_search: true,
			pagination_type: PaginationType::default(),
			debounce_time: DEFAULT_DEBOUNCE_TIME,
			omit_in_url: Vec::new(),
			parameter_keys: Vec::new(),
			validation: Validation::default(),
			refetch_exempt: RequestType::HEAD_OF_SEQUENCE.to_vec(),
		}
	}
}
impl Options {
	/// Repairs values the coordinator can't work with.
	#[must_use]
	pub fn normalized(mut self) -> Self {
		if self.limit == 0 {
			warn!(default = DEFAULT_LIMIT, "`limit` must be positive. Using the default.");
			self.limit = DEFAULT_LIMIT;
		}
		self
	}

	#[must_use]
	pub fn debounce_window(&self) -> Duration {
		Duration::from_millis(self.debounce_time)
	}
}
