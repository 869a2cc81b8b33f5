use core::fmt::{self, Debug, Formatter};
use num_traits::{CheckedAdd, One, Zero};

/// Hands out strictly increasing identifiers, refusing to wrap around.
///
/// An identifier is only ever compared for equality with the "current" one, so a wrapped counter could resurrect a stale request.
pub struct Sequence<C>(C)
where
	C: CheckedAdd + One + Zero + Copy;
impl<C> Default for Sequence<C>
where
	C: CheckedAdd + One + Zero + Copy,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Sequence<C>
where
	C: CheckedAdd + One + Zero + Copy,
{
	#[must_use]
	pub fn new() -> Self {
		Self(C::zero())
	}

	/// # Errors
	///
	/// Iff the counter is saturated.
	pub fn next(&mut self) -> Result<C, SequenceSaturatedError> {
		self.0 = self.0.checked_add(&C::one()).ok_or(SequenceSaturatedError)?;
		Ok(self.0)
	}
}
impl<C> Debug for Sequence<C>
where
	C: CheckedAdd + One + Zero + Copy + Debug,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Sequence").field(&self.0).finish()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier sequence saturated")]
pub struct SequenceSaturatedError;

/// Cancellation handle of one fetch. Exactly one is current per [`ListSearch`](`crate::ListSearch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub(crate) u64);
impl RequestToken {
	/// For transports that have to round-trip the token through foreign code.
	#[must_use]
	pub fn get(self) -> u64 {
		self.0
	}
}

/// Identifies one armed debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);
impl TimerId {
	#[must_use]
	pub fn get(self) -> u64 {
		self.0
	}
}
