//! Browser bindings: the address bar, `setTimeout` and `fetch`.
//!
//! [`attach`] wires a [`ListSearch`] to all three. The capabilities hold weak references back to the instance
//! and only ever call into it from separate tasks, so its [`RefCell`] is never borrowed re-entrantly.

use crate::{
	debounce::Timer,
	list::{ListSearch, Services},
	query::Initial,
	result::ResultPage,
	sequence::{RequestToken, TimerId},
	transport::{FetchError, FetchRequest, Transport},
	url_sync::Location,
	Options,
};
use core::{convert::TryFrom, time::Duration};
use js_sys::Function;
use serde::de::DeserializeOwned;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

/// Creates a [`ListSearch`] bound to the current window and mounts it.
///
/// `configure` can install a validator, transforms or an event listener before mounting.
pub fn attach<T>(options: Options, initial: Initial, configure: impl FnOnce(ListSearch<T>) -> ListSearch<T>) -> Rc<RefCell<ListSearch<T>>>
where
	T: DeserializeOwned + Clone + 'static,
{
	let list = Rc::new_cyclic(|owner: &Weak<RefCell<ListSearch<T>>>| {
		RefCell::new(configure(ListSearch::new(
			options,
			initial,
			Services {
				transport: Box::new(FetchTransport::new(owner.clone())),
				timer: Box::new(WindowTimer::new(owner.clone())),
				location: Box::new(WindowLocation),
			},
		)))
	});
	list.borrow_mut().mount();
	list
}

fn with_owner<T>(owner: &Weak<RefCell<ListSearch<T>>>, f: impl FnOnce(&mut ListSearch<T>)) {
	let list = match owner.upgrade() {
		Some(list) => list,
		None => return trace!("The list was dropped in the meantime."),
	};
	let mut list = match list.try_borrow_mut() {
		Ok(list) => list,
		Err(_) => return error!("The list is already borrowed. Callbacks must not be invoked re-entrantly."),
	};
	f(&mut list);
}

/// `window.location`, written through `history.replaceState` so no history entry is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowLocation;
impl Location for WindowLocation {
	fn search(&self) -> Option<String> {
		web_sys::window()?
			.location()
			.search()
			.map_err(|error| error!(?error, "Can't read `location.search`."))
			.ok()
	}

	fn replace_search(&mut self, search: &str) {
		let window = match web_sys::window() {
			Some(window) => window,
			None => return,
		};
		let location = window.location();
		let (pathname, hash) = match (location.pathname(), location.hash()) {
			(Ok(pathname), Ok(hash)) => (pathname, hash),
			_ => return error!("Can't read the current location."),
		};
		let url = if search.is_empty() {
			format!("{}{}", pathname, hash)
		} else {
			format!("{}?{}{}", pathname, search, hash)
		};

		let history = match window.history() {
			Ok(history) => history,
			Err(error) => return error!(?error, "Can't access `window.history`."),
		};
		if let Err(error) = history.replace_state_with_url(&JsValue::NULL, "", Some(&url)) {
			error!(?error, url = url.as_str(), "`history.replaceState` failed.");
		}
	}
}

struct Armed {
	id: TimerId,
	handle: i32,
	/// Must outlive the timeout.
	_callback: Closure<dyn FnMut()>,
}

/// `setTimeout`/`clearTimeout`. Holds at most one timeout, matching the debouncer.
pub struct WindowTimer<T> {
	owner: Weak<RefCell<ListSearch<T>>>,
	armed: Option<Armed>,
}
impl<T> WindowTimer<T> {
	#[must_use]
	pub fn new(owner: Weak<RefCell<ListSearch<T>>>) -> Self {
		Self { owner, armed: None }
	}

	fn clear(&mut self) {
		if let Some(armed) = self.armed.take() {
			if let Some(window) = web_sys::window() {
				window.clear_timeout_with_handle(armed.handle);
			}
		}
	}
}
impl<T: Clone + 'static> Timer for WindowTimer<T> {
	fn schedule(&mut self, id: TimerId, delay: Duration) {
		self.clear();
		let window = match web_sys::window() {
			Some(window) => window,
			None => return error!("No `window` to schedule a timer on."),
		};

		let owner = self.owner.clone();
		let callback = Closure::wrap(Box::new(move || {
			with_owner(&owner, |list| {
				list.timer_elapsed(id);
			})
		}) as Box<dyn FnMut()>);
		let timeout = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

		match window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref::<Function>(), timeout) {
			Ok(handle) => {
				self.armed = Some(Armed {
					id,
					handle,
					_callback: callback,
				})
			}
			Err(error) => error!(?error, "`setTimeout` failed."),
		}
	}

	fn cancel(&mut self, id: TimerId) {
		if self.armed.as_ref().map_or(false, |armed| armed.id == id) {
			self.clear();
		}
	}
}
impl<T> Drop for WindowTimer<T> {
	fn drop(&mut self) {
		// The callback is freed with `self`, so the timeout must not fire anymore.
		self.clear();
	}
}

/// `window.fetch` with one `AbortController` per request.
pub struct FetchTransport<T> {
	owner: Weak<RefCell<ListSearch<T>>>,
	current: Option<(RequestToken, web_sys::AbortController)>,
}
impl<T> FetchTransport<T> {
	#[must_use]
	pub fn new(owner: Weak<RefCell<ListSearch<T>>>) -> Self {
		Self { owner, current: None }
	}
}
impl<T: DeserializeOwned + Clone + 'static> Transport for FetchTransport<T> {
	fn dispatch(&mut self, request: FetchRequest) {
		let token = request.token;
		let url = request.url();
		let controller = web_sys::AbortController::new()
			.map_err(|error| error!(?error, "Can't create an `AbortController`. The request won't be abortable."))
			.ok();
		let signal = controller.as_ref().map(web_sys::AbortController::signal);
		self.current = controller.map(|controller| (token, controller));

		let owner = self.owner.clone();
		spawn_local(async move {
			let outcome = fetch_page::<T>(&url, signal.as_ref()).await;
			with_owner(&owner, |list| list.resolve(token, outcome));
		});
	}

	fn abort(&mut self, token: RequestToken) {
		match self.current.take() {
			Some((current, controller)) if current == token => controller.abort(),
			other => self.current = other,
		}
	}
}
impl<T> Drop for FetchTransport<T> {
	fn drop(&mut self) {
		if let Some((_, controller)) = self.current.take() {
			controller.abort();
		}
	}
}

async fn fetch_page<T: DeserializeOwned>(url: &str, signal: Option<&web_sys::AbortSignal>) -> Result<ResultPage<T>, FetchError> {
	let window = web_sys::window().ok_or_else(|| FetchError::Network("no `window`".to_owned()))?;
	let init = web_sys::RequestInit::new();
	init.set_method("GET");
	init.set_signal(signal);

	let response = JsFuture::from(window.fetch_with_str_and_init(url, &init)).await.map_err(js_failure)?;
	let response: web_sys::Response = response
		.dyn_into()
		.map_err(|value| FetchError::Decode(format!("expected a `Response` but got {:?}", value)))?;
	if !response.ok() {
		return Err(FetchError::Status(response.status()));
	}

	let text = JsFuture::from(response.text().map_err(js_failure)?).await.map_err(js_failure)?;
	let text = text.as_string().ok_or_else(|| FetchError::Decode("response body is not text".to_owned()))?;
	serde_json::from_str(&text).map_err(|error| FetchError::Decode(error.to_string()))
}

fn js_failure(error: JsValue) -> FetchError {
	match error.dyn_ref::<web_sys::DomException>() {
		Some(exception) if exception.name() == "AbortError" => FetchError::Cancelled,
		_ => FetchError::Network(format!("{:?}", error)),
	}
}
