//! The request coordinator: decides when to fetch, supersedes in-flight requests and reconciles responses.

use crate::{
	codec::{Params, Value},
	debounce::{Debouncer, Timer},
	options::Options,
	pagination::{self, PageTarget, Pages},
	query::{cursor_of, Cursor, Initial, QueryState, LIMIT_KEY, OFFSET_KEY},
	result::{PageInfo, ResultPage, ResultState},
	sequence::{RequestToken, Sequence, TimerId},
	transport::{FetchError, FetchRequest, Transport},
	url_sync::{Location, UrlMirror},
	validation::ValidationGate,
};
use hashbrown::HashSet;
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::{debug, error, info, instrument, trace, warn};

/// Why a request was made. Determines reconciliation only; the wire request is always the same kind of `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
	/// First fetch on mount.
	Initial,
	/// Live search after a parameter edit.
	New,
	/// Explicit submit.
	Clean,
	/// Facet selection changed.
	Filter,
	/// "Load more".
	Append,
	/// Random access into the page cache.
	Page,
}
impl RequestType {
	/// Types that start a fresh result set from offset 0.
	pub const HEAD_OF_SEQUENCE: [RequestType; 4] = [RequestType::Initial, RequestType::New, RequestType::Clean, RequestType::Filter];

	#[must_use]
	pub fn strategy(self) -> Strategy {
		match self {
			RequestType::Initial | RequestType::New | RequestType::Clean | RequestType::Filter => Strategy::Replace,
			RequestType::Append => Strategy::Append,
			RequestType::Page => Strategy::PageInsert,
		}
	}
}

/// How a response is merged into the [`ResultState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
	Replace,
	Append,
	PageInsert,
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	/// A request is in flight now.
	Issued(RequestToken),
	/// A live search will be dispatched once the debounce window passes without further edits.
	Scheduled(TimerId),
	/// The requested page was already cached.
	Cached,
	/// The query failed validation. Nothing was requested and the URL mirror was cleared.
	Rejected,
	/// Nothing to do, e.g. live search is off.
	Idle,
	/// There is nothing more to load.
	Exhausted,
}

/// Emitted after each committed state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
	LoadingBegan,
	LoadingEnded,
	ResultChanged,
	/// The number of currently presented items changed.
	ItemCountChanged(usize),
	/// The 1-based current page changed.
	PageChanged(u32),
	/// A request failed for a reason other than being superseded. The previous result is kept.
	Failed(FetchError),
}

/// The environment capabilities a [`ListSearch`] drives.
pub struct Services {
	pub transport: Box<dyn Transport>,
	pub timer: Box<dyn Timer>,
	pub location: Box<dyn Location>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
	Primary { previous_total: Option<u32> },
	/// Issued because the total changed. Never triggers another refetch.
	Refetch,
}

#[derive(Debug)]
struct InFlight {
	token: RequestToken,
	request_type: RequestType,
	/// 1-based target page of [`RequestType::Page`] requests.
	page: u32,
	params: Params,
	stage: Stage,
	/// The URL-supplied cursor a widened initial fetch stands in for.
	deep_link: Option<Cursor>,
}

/// One list/search widget's state machine.
///
/// All methods are synchronous. Responses and timer wake-ups are fed back in through
/// [`resolve`](`ListSearch::resolve`) and [`timer_elapsed`](`ListSearch::timer_elapsed`).
///
/// At most one request is current at any time. Issuing a new one aborts the previous one,
/// and outcomes for anything but the current token are discarded without touching any state.
pub struct ListSearch<T = Json> {
	options: Options,
	query: QueryState,
	result: ResultState<T>,
	pages: Pages,
	gate: ValidationGate,
	refetch_exempt: HashSet<RequestType>,
	transport: Box<dyn Transport>,
	timer: Box<dyn Timer>,
	url: UrlMirror,
	debouncer: Debouncer<RequestType>,
	tokens: Sequence<u64>,
	in_flight: Option<InFlight>,
	loading: bool,
	has_fetched_once: bool,
	transform_params: Box<dyn Fn(Params) -> Params>,
	transform_result: Box<dyn Fn(ResultPage<T>) -> ResultPage<T>>,
	listener: Option<Box<dyn FnMut(&ListEvent)>>,
}

impl<T: Clone + 'static> ListSearch<T> {
	/// Nothing is read or requested before [`mount`](`ListSearch::mount`).
	#[must_use]
	pub fn new(options: Options, initial: Initial, services: Services) -> Self {
		let options = options.normalized();
		Self {
			query: QueryState::new(initial, options.limit),
			result: ResultState::default(),
			pages: Pages::default(),
			gate: options.validation.clone().into(),
			refetch_exempt: options.refetch_exempt.iter().copied().collect(),
			transport: services.transport,
			timer: services.timer,
			url: UrlMirror::new(services.location, options.omit_in_url.iter().cloned()),
			debouncer: Debouncer::new(options.debounce_window()),
			tokens: Sequence::new(),
			in_flight: None,
			loading: false,
			has_fetched_once: false,
			transform_params: Box::new(|params: Params| params),
			transform_result: Box::new(|page: ResultPage<T>| page),
			listener: None,
			options,
		}
	}

	/// Replaces the validation configured through [`Options::validation`].
	#[must_use]
	pub fn with_validator(mut self, gate: ValidationGate) -> Self {
		self.gate = gate;
		self
	}

	/// Applied to the parameters right before they go on the wire. The URL mirror sees them untransformed.
	#[must_use]
	pub fn with_param_transform(mut self, transform: impl Fn(Params) -> Params + 'static) -> Self {
		self.transform_params = Box::new(transform);
		self
	}

	/// Applied to each page before reconciliation, including the total-changed comparison.
	#[must_use]
	pub fn with_result_transform(mut self, transform: impl Fn(ResultPage<T>) -> ResultPage<T> + 'static) -> Self {
		self.transform_result = Box::new(transform);
		self
	}

	/// The listener must not call back into this instance.
	#[must_use]
	pub fn on_event(mut self, listener: impl FnMut(&ListEvent) + 'static) -> Self {
		self.listener = Some(Box::new(listener));
		self
	}

	/// Merges the address bar's query over the host's initial values and fetches if configured to or deep-linked.
	///
	/// Under "more"-style pagination, a deep link with a non-zero offset is loaded in one widened request from offset 0,
	/// after which pagination resumes at the deep-linked boundary.
	#[instrument(skip(self))]
	pub fn mount(&mut self) -> Dispatch {
		let parameter_keys: HashSet<String> = self.options.parameter_keys.iter().cloned().collect();
		if self.query.apply_url(self.url.read(), &parameter_keys) {
			debug!("Deep-linked. Fetching immediately.");
			self.options.immediate = true;
		}
		if !self.options.immediate {
			return Dispatch::Idle;
		}

		let saved = self.query.cursor();
		if saved.offset > 0 && self.options.pagination_type.is_more() {
			let widened = Cursor { limit: saved.end(), offset: 0 };
			self.query.set_cursor(widened);
			self.gated(RequestType::Initial, widened, 1, Some(saved))
		} else {
			self.gated(RequestType::Initial, saved, 1, None)
		}
	}

	/// Explicit submit: requests the first page of the current query right away.
	#[instrument(skip(self))]
	pub fn submit(&mut self) -> Dispatch {
		self.debouncer.cancel(&mut *self.timer);
		self.query.reset_pagination();
		self.gated(RequestType::Clean, self.query.cursor(), 1, None)
	}

	#[instrument(skip(self, key, value))]
	pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Dispatch {
		self.query.set_parameter(key, value);
		self.query_changed(RequestType::New)
	}

	/// Replaces a facet's whole selection.
	#[instrument(skip(self, alias, values))]
	pub fn set_facet(&mut self, alias: impl Into<String>, values: impl IntoIterator<Item = String>) -> Dispatch {
		self.query.set_facet(alias, values);
		self.query_changed(RequestType::Filter)
	}

	/// Selects `value` (compared as string) if it isn't selected yet, otherwise deselects it.
	#[instrument(skip(self, alias, value))]
	pub fn toggle_facet_value(&mut self, alias: impl Into<String>, value: impl ToString) -> Dispatch {
		self.query.toggle_facet_value(alias, value);
		self.query_changed(RequestType::Filter)
	}

	/// Loads the next page (or with `all`, everything that's left) and appends it.
	#[instrument(skip(self))]
	pub fn more(&mut self, all: bool) -> Dispatch {
		if !self.result.can_fetch_more() {
			return Dispatch::Exhausted;
		}
		let PageInfo { limit, offset, total } = self.result.pagination();
		let limit = limit.unwrap_or(self.options.limit);
		let next_offset = offset.unwrap_or(0).saturating_add(limit);
		let next_limit = match total {
			Some(total) if all => total.saturating_sub(next_offset),
			_ => limit,
		};
		let cursor = Cursor { limit: next_limit, offset: next_offset };
		self.query.set_cursor(cursor);
		self.gated(RequestType::Append, cursor, 1, None)
	}

	/// Shorthand for [`more(true)`](`ListSearch::more`).
	pub fn all(&mut self) -> Dispatch {
		self.more(true)
	}

	/// Moves the current page pointer (clamped to `1..=max_page`) and fetches that page unless it's cached.
	///
	/// The pointer doesn't move if the page would have to be fetched but the query is invalid.
	#[instrument(skip(self))]
	pub fn go_to(&mut self, target: impl Into<PageTarget> + core::fmt::Debug) -> Dispatch {
		let mut pages = self.pages;
		let page = pages.go_to(target.into());
		let cached = self.result.is_page_cached(pagination::index_of(page));
		let cursor = Cursor {
			limit: self.options.limit,
			offset: pagination::offset_of(page, self.options.limit),
		};
		if !cached && !self.gate.is_valid(&self.query.request_params_at(cursor)) {
			self.reject();
			return Dispatch::Rejected;
		}

		let page_before = self.pages.current();
		let count_before = self.current_items().len();
		self.pages = pages;
		self.emit_page_change(page_before);
		self.emit_count_change(count_before);

		if cached {
			trace!(page, "Page is cached.");
			return Dispatch::Cached;
		}
		self.query.set_cursor(cursor);
		self.gated(RequestType::Page, cursor, page, None)
	}

	/// Clears every facet selection, pagination and the result set. Search parameters are kept.
	#[instrument(skip(self))]
	pub fn reset_query(&mut self) {
		self.cancel();
		self.query.reset();
		self.clear_result();
	}

	/// First page at the configured limit, with the total unknown again.
	pub fn reset_pagination(&mut self) {
		self.query.reset_pagination();
		self.result.set_pagination(PageInfo {
			limit: Some(self.options.limit),
			offset: Some(0),
			total: None,
		});
	}

	/// Drops the pending live search and aborts the in-flight request.
	pub fn cancel(&mut self) {
		self.debouncer.cancel(&mut *self.timer);
		self.supersede();
		self.set_loading(false);
	}

	/// Called by the [`Timer`] once a debounce window passed. Stale ids are ignored.
	#[instrument(skip(self))]
	pub fn timer_elapsed(&mut self, id: TimerId) -> Dispatch {
		let request_type = match self.debouncer.fire(id) {
			Some(request_type) => request_type,
			None => {
				trace!("Ignoring stale timer.");
				return Dispatch::Idle;
			}
		};
		self.query.reset_pagination();
		self.gated(request_type, self.query.cursor(), 1, None)
	}

	/// Called by the [`Transport`] once a request settled.
	///
	/// Outcomes of superseded requests are discarded without any effect.
	#[instrument(skip(self, outcome))]
	pub fn resolve(&mut self, token: RequestToken, outcome: Result<ResultPage<T>, FetchError>) {
		let flight = match self.in_flight.take() {
			Some(flight) if flight.token == token => flight,
			other => {
				self.in_flight = other;
				trace!("Discarding the outcome of a superseded request.");
				return;
			}
		};

		let page = match outcome {
			Ok(page) => (self.transform_result)(page),
			Err(FetchError::Cancelled) => {
				trace!("Current request was cancelled externally.");
				self.set_loading(false);
				return;
			}
			Err(error) => {
				warn!(%error, "Request failed.");
				self.set_loading(false);
				return self.emit(ListEvent::Failed(error));
			}
		};

		if let Stage::Primary { previous_total } = flight.stage {
			if self.total_changed(flight.request_type, previous_total, page.pagination.total) {
				info!(?previous_total, total = ?page.pagination.total, "Total changed since the last request. Refetching from the first page.");
				let mut params = flight.params;
				params.insert(LIMIT_KEY, self.options.limit);
				params.insert(OFFSET_KEY, 0_u32);
				self.issue(RequestType::New, params, 1, None, Stage::Refetch);
				return;
			}
		}

		self.reconcile(flight, page);
	}

	fn total_changed(&self, request_type: RequestType, previous: Option<u32>, current: Option<u32>) -> bool {
		match (previous, current) {
			(Some(previous), Some(current)) => previous != current && !self.refetch_exempt.contains(&request_type),
			_ => false,
		}
	}

	fn reconcile(&mut self, flight: InFlight, page: ResultPage<T>) {
		let ResultPage {
			items,
			pagination,
			facets,
			meta,
			misc,
			extra,
		} = page;
		let requested = cursor_of(&flight.params).unwrap_or_else(|| self.query.cursor());
		let mut pagination = pagination.or_requested(requested);
		let offset = pagination.offset.unwrap_or(requested.offset);
		let page_before = self.pages.current();
		let count_before = self.current_items().len();

		match flight.request_type.strategy() {
			Strategy::Replace => {
				self.result.replace(items, (offset / self.options.limit) as usize);
				if let Some(facets) = facets {
					self.query.seed_facets(&facets);
					self.result.set_facets(facets);
				}
				self.pages.reset_to(offset, self.options.limit);
			}
			Strategy::Append => self.result.append(items),
			Strategy::PageInsert => self.result.insert_page(pagination::index_of(flight.page), items),
		}

		let committed = if let Some(saved) = flight.deep_link {
			let resume = Cursor {
				limit: self.options.limit,
				offset: saved.end().saturating_sub(self.options.limit),
			};
			info!(?resume, "Resuming deep-linked pagination.");
			pagination.limit = Some(resume.limit);
			pagination.offset = Some(resume.offset);
			self.query.set_cursor(resume);
			self.query.request_params()
		} else {
			self.query.set_cursor(Cursor { limit: self.options.limit, offset });
			flight.params
		};

		self.result.set_pagination(pagination);
		self.result.set_pass_through(meta, misc, extra);
		self.pages.set_total(pagination.total, self.options.limit);
		self.url.commit(&committed);
		self.has_fetched_once = true;
		self.set_loading(false);
		self.emit(ListEvent::ResultChanged);
		self.emit_page_change(page_before);
		self.emit_count_change(count_before);
	}

	/// Validates `cursor`'s request and issues it. Invalid queries are rejected instead.
	fn gated(&mut self, request_type: RequestType, cursor: Cursor, page: u32, deep_link: Option<Cursor>) -> Dispatch {
		let params = self.query.request_params_at(cursor);
		if !self.gate.is_valid(&params) {
			self.reject();
			return Dispatch::Rejected;
		}
		let previous_total = self.result.pagination().total;
		self.issue(request_type, params, page, deep_link, Stage::Primary { previous_total })
	}

	fn issue(&mut self, request_type: RequestType, params: Params, page: u32, deep_link: Option<Cursor>, stage: Stage) -> Dispatch {
		self.supersede();
		let token = match self.tokens.next() {
			Ok(token) => RequestToken(token),
			Err(error) => {
				error!(%error, "Can't issue any more requests.");
				self.set_loading(false);
				return Dispatch::Idle;
			}
		};
		debug!(?token, ?request_type, ?stage, "Dispatching request.");
		if cfg!(feature = "dangerous-logging") {
			trace!(?params);
		}

		let request = FetchRequest {
			token,
			endpoint: self.options.api.clone(),
			params: (self.transform_params)(params.clone()),
		};
		self.in_flight = Some(InFlight {
			token,
			request_type,
			page,
			params,
			stage,
			deep_link,
		});
		self.set_loading(true);
		self.transport.dispatch(request);
		Dispatch::Issued(token)
	}

	/// Aborts the in-flight request, if any. Its eventual outcome is ignored.
	fn supersede(&mut self) {
		if let Some(previous) = self.in_flight.take() {
			trace!(token = ?previous.token, "Superseding request.");
			self.transport.abort(previous.token);
		}
	}

	fn query_changed(&mut self, request_type: RequestType) -> Dispatch {
		if !self.gate.is_valid(&self.query.request_params()) {
			self.reject();
			return Dispatch::Rejected;
		}
		if !self.live_search_enabled() {
			return Dispatch::Idle;
		}
		match self.debouncer.arm(&mut *self.timer, request_type) {
			Ok(id) => Dispatch::Scheduled(id),
			Err(error) => {
				error!(%error, "Can't schedule any more live searches.");
				Dispatch::Idle
			}
		}
	}

	/// Invalid queries show nothing and leave no trace in the address bar. Query edits are kept.
	fn reject(&mut self) {
		debug!("Query failed validation.");
		self.cancel();
		self.clear_result();
		self.url.clear();
	}

	fn clear_result(&mut self) {
		let page_before = self.pages.current();
		let count_before = self.current_items().len();
		self.result.clear();
		self.pages = Pages::default();
		if count_before != 0 {
			self.emit(ListEvent::ResultChanged);
		}
		self.emit_page_change(page_before);
		self.emit_count_change(count_before);
	}
}

impl<T> ListSearch<T> {
	#[must_use]
	pub fn options(&self) -> &Options {
		&self.options
	}

	#[must_use]
	pub fn query(&self) -> &QueryState {
		&self.query
	}

	#[must_use]
	pub fn result(&self) -> &ResultState<T> {
		&self.result
	}

	#[must_use]
	pub fn pages(&self) -> Pages {
		self.pages
	}

	#[must_use]
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Sticky once set.
	#[must_use]
	pub fn has_fetched_once(&self) -> bool {
		self.has_fetched_once
	}

	/// With `immediate`, live search only starts after the first fetch.
	#[must_use]
	pub fn live_search_enabled(&self) -> bool {
		self.options.live_search && (!self.options.immediate || self.has_fetched_once)
	}

	#[must_use]
	pub fn is_valid(&self) -> bool {
		self.gate.is_valid(&self.query.request_params())
	}

	/// Whether a live search is waiting for its debounce window.
	#[must_use]
	pub fn is_search_pending(&self) -> bool {
		self.debouncer.is_pending()
	}

	#[must_use]
	pub fn can_fetch_more(&self) -> bool {
		self.result.can_fetch_more()
	}

	/// Everything loaded so far under "more"-style pagination, otherwise the current page (empty if not cached yet).
	#[must_use]
	pub fn current_items(&self) -> &[T] {
		if self.options.pagination_type.is_more() {
			self.result.items()
		} else {
			self.result.page(self.pages.current_index()).unwrap_or(&[])
		}
	}

	/// Never before the first fetch.
	#[must_use]
	pub fn show_pagination(&self) -> bool {
		if !self.has_fetched_once {
			false
		} else if self.options.pagination_type.is_more() {
			self.result.can_fetch_more()
		} else {
			self.pages.max() > 1
		}
	}

	fn set_loading(&mut self, loading: bool) {
		if self.loading != loading {
			self.loading = loading;
			self.emit(if loading { ListEvent::LoadingBegan } else { ListEvent::LoadingEnded });
		}
	}

	fn emit_page_change(&mut self, page_before: u32) {
		let page = self.pages.current();
		if page != page_before {
			self.emit(ListEvent::PageChanged(page));
		}
	}

	fn emit_count_change(&mut self, count_before: usize) {
		let count = self.current_items().len();
		if count != count_before {
			self.emit(ListEvent::ItemCountChanged(count));
		}
	}

	fn emit(&mut self, event: ListEvent) {
		trace!(?event, "Emitting.");
		if let Some(listener) = &mut self.listener {
			listener(&event);
		}
	}
}
