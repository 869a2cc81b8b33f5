//! A single-slot trailing debounce over an injected timer capability.

use crate::sequence::{Sequence, SequenceSaturatedError, TimerId};
use core::time::Duration;

/// Schedules wake-ups. Implementations call back into [`ListSearch::timer_elapsed`](`crate::ListSearch::timer_elapsed`)
/// with the same [`TimerId`] once `delay` has passed, unless cancelled first.
///
/// Callbacks must arrive asynchronously, never from within [`schedule`](`Timer::schedule`) itself.
pub trait Timer {
	fn schedule(&mut self, id: TimerId, delay: Duration);
	fn cancel(&mut self, id: TimerId);
}

/// At most one pending action. Re-arming replaces (not queues) the pending one.
#[derive(Debug)]
pub struct Debouncer<A> {
	window: Duration,
	ids: Sequence<u64>,
	pending: Option<(TimerId, A)>,
}
impl<A> Debouncer<A> {
	#[must_use]
	pub fn new(window: Duration) -> Self {
		Self {
			window,
			ids: Sequence::new(),
			pending: None,
		}
	}

	#[must_use]
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Replaces any pending action, cancelling its timer, and arms a new one.
	///
	/// # Errors
	///
	/// Iff timer identifiers ran out. The previous action is cancelled regardless.
	pub fn arm(&mut self, timer: &mut dyn Timer, action: A) -> Result<TimerId, SequenceSaturatedError> {
		self.cancel(timer);
		let id = TimerId(self.ids.next()?);
		self.pending = Some((id, action));
		timer.schedule(id, self.window);
		Ok(id)
	}

	/// Takes the pending action iff `id` is the most recently armed timer.
	pub fn fire(&mut self, id: TimerId) -> Option<A> {
		match self.pending.take() {
			Some((pending_id, action)) if pending_id == id => Some(action),
			other => {
				self.pending = other;
				None
			}
		}
	}

	/// Drops the pending action, if any.
	pub fn cancel(&mut self, timer: &mut dyn Timer) -> Option<A> {
		let (id, action) = self.pending.take()?;
		timer.cancel(id);
		Some(action)
	}

	#[must_use]
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}
