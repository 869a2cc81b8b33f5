#![allow(dead_code)]

use core::time::Duration;
use list_search::{Dispatch, FetchRequest, Initial, ListEvent, ListSearch, MemoryLocation, Options, PageInfo, RequestToken, ResultPage, Services, Timer, TimerId, Transport};
use std::{cell::RefCell, rc::Rc};

/// Records requests instead of sending them.
#[derive(Clone, Default)]
pub struct FakeTransport {
	pub sent: Rc<RefCell<Vec<FetchRequest>>>,
	pub aborted: Rc<RefCell<Vec<RequestToken>>>,
}
impl Transport for FakeTransport {
	fn dispatch(&mut self, request: FetchRequest) {
		self.sent.borrow_mut().push(request);
	}

	fn abort(&mut self, token: RequestToken) {
		self.aborted.borrow_mut().push(token);
	}
}
impl FakeTransport {
	pub fn count(&self) -> usize {
		self.sent.borrow().len()
	}

	pub fn last(&self) -> FetchRequest {
		self.sent.borrow().last().cloned().expect("Nothing was sent.")
	}
}

/// Only fires when told to.
#[derive(Clone, Default)]
pub struct ManualTimer {
	pub armed: Rc<RefCell<Option<TimerId>>>,
	pub cancelled: Rc<RefCell<Vec<TimerId>>>,
}
impl Timer for ManualTimer {
	fn schedule(&mut self, id: TimerId, _: Duration) {
		*self.armed.borrow_mut() = Some(id);
	}

	fn cancel(&mut self, id: TimerId) {
		self.cancelled.borrow_mut().push(id);
		let mut armed = self.armed.borrow_mut();
		if *armed == Some(id) {
			*armed = None;
		}
	}
}

pub struct Harness {
	pub list: ListSearch<u32>,
	pub transport: FakeTransport,
	pub timer: ManualTimer,
	pub location: MemoryLocation,
	pub events: Rc<RefCell<Vec<ListEvent>>>,
}

pub fn harness(options: Options, initial: Initial, search: &str) -> Harness {
	let transport = FakeTransport::default();
	let timer = ManualTimer::default();
	let location = MemoryLocation::new(search);
	let events = Rc::new(RefCell::new(Vec::new()));

	let list = ListSearch::new(
		options,
		initial,
		Services {
			transport: Box::new(transport.clone()),
			timer: Box::new(timer.clone()),
			location: Box::new(location.clone()),
		},
	)
	.on_event({
		let events = Rc::clone(&events);
		move |event| events.borrow_mut().push(event.clone())
	});

	Harness {
		list,
		transport,
		timer,
		location,
		events,
	}
}

impl Harness {
	/// Lets the armed debounce timer elapse.
	pub fn elapse(&mut self) -> Dispatch {
		let id = self.timer.armed.borrow_mut().take().expect("No timer armed.");
		self.list.timer_elapsed(id)
	}

	/// Answers the most recent request from a data set of `0..total`.
	pub fn serve(&mut self, total: u32) {
		let request = self.transport.last();
		let limit = number(&request, "limit");
		let offset = number(&request, "offset");
		self.list.resolve(request.token, Ok(page(offset..(offset + limit).min(total), limit, offset, Some(total))));
	}

	pub fn take_events(&self) -> Vec<ListEvent> {
		self.events.borrow_mut().drain(..).collect()
	}
}

pub fn page(items: impl IntoIterator<Item = u32>, limit: u32, offset: u32, total: Option<u32>) -> ResultPage<u32> {
	ResultPage::new(
		items.into_iter().collect(),
		PageInfo {
			limit: Some(limit),
			offset: Some(offset),
			total,
		},
	)
}

pub fn param(request: &FetchRequest, key: &str) -> Option<String> {
	request.params.get(key)?.as_scalar().map(ToOwned::to_owned)
}

pub fn number(request: &FetchRequest, key: &str) -> u32 {
	param(request, key).expect("Missing parameter.").parse().expect("Not a number.")
}

pub fn issued(dispatch: Dispatch) -> RequestToken {
	match dispatch {
		Dispatch::Issued(token) => token,
		other => panic!("Expected a request, got {:?}", other),
	}
}

pub fn with_keywords(keywords: &str) -> Initial {
	Initial {
		parameters: vec![("keywords", keywords)].into_iter().collect(),
		..Initial::default()
	}
}

pub fn immediate() -> Options {
	Options {
		immediate: true,
		..Options::default()
	}
}
