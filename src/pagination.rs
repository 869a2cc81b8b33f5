use serde::Deserialize;

/// How the host presents pagination. Only affects deep-link handling and which derived views apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
	/// "Load more" appends the next page.
	More,
	/// Like [`More`](`PaginationType::More`), but the host may also load everything that's left.
	All,
	/// Previous/next flow through a page cache.
	Navigation,
	/// Numbered pages.
	Numeric,
	/// Numbered pages with previous/next.
	Pagination,
}
impl Default for PaginationType {
	fn default() -> Self {
		PaginationType::More
	}
}
impl PaginationType {
	/// Whether results accumulate into one growing list.
	#[must_use]
	pub fn is_more(self) -> bool {
		matches!(self, PaginationType::More | PaginationType::All)
	}

	#[must_use]
	pub fn is_numeric(self) -> bool {
		matches!(self, PaginationType::Numeric | PaginationType::Pagination)
	}

	#[must_use]
	pub fn is_flow(self) -> bool {
		matches!(self, PaginationType::Navigation | PaginationType::Pagination)
	}
}

/// Argument of [`ListSearch::go_to`](`crate::ListSearch::go_to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
	Next,
	Previous,
	/// 1-based.
	Number(u32),
}
impl From<u32> for PageTarget {
	fn from(page: u32) -> Self {
		PageTarget::Number(page)
	}
}

/// The current page pointer, 1-based and kept within `1..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pages {
	current: u32,
	max: u32,
}
impl Default for Pages {
	fn default() -> Self {
		Self { current: 1, max: 1 }
	}
}
impl Pages {
	#[must_use]
	pub fn current(self) -> u32 {
		self.current
	}

	#[must_use]
	pub fn max(self) -> u32 {
		self.max
	}

	/// 0-based index into the page cache.
	#[must_use]
	pub fn current_index(self) -> usize {
		index_of(self.current)
	}

	/// `ceil(total / limit)`, at least 1. An unknown total keeps the previous maximum.
	pub fn set_total(&mut self, total: Option<u32>, limit: u32) {
		if let Some(total) = total {
			self.max = max_page(total, limit);
		}
		self.current = self.current.min(self.max);
	}

	/// Moves the pointer and returns the new current page.
	pub fn go_to(&mut self, target: PageTarget) -> u32 {
		let requested = match target {
			PageTarget::Next => self.current.saturating_add(1),
			PageTarget::Previous => self.current.saturating_sub(1),
			PageTarget::Number(page) => page,
		};
		self.current = requested.max(1).min(self.max);
		self.current
	}

	/// Points at the page containing `offset`, widening `max` if needed.
	pub fn reset_to(&mut self, offset: u32, limit: u32) {
		self.current = offset / limit.max(1) + 1;
		self.max = self.max.max(self.current);
	}
}

#[must_use]
pub fn max_page(total: u32, limit: u32) -> u32 {
	let limit = limit.max(1);
	(total / limit + u32::from(total % limit != 0)).max(1)
}

/// Offset of a 1-based page.
#[must_use]
pub fn offset_of(page: u32, limit: u32) -> u32 {
	page.saturating_sub(1).saturating_mul(limit)
}

/// 0-based cache index of a 1-based page.
#[must_use]
pub fn index_of(page: u32) -> usize {
	page.saturating_sub(1) as usize
}
