use crate::{
	codec::{encode, Params},
	sequence::RequestToken,
};

/// Why a fetch produced no page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
	/// Superseded by a newer request. Expected and silent.
	#[error("request was superseded")]
	Cancelled,
	#[error("network failure: {0}")]
	Network(String),
	#[error("server responded with HTTP {0}")]
	Status(u16),
	#[error("malformed response: {0}")]
	Decode(String),
}
impl FetchError {
	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		matches!(self, FetchError::Cancelled)
	}
}

/// A uniform `GET` of `endpoint` with `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
	pub token: RequestToken,
	pub endpoint: String,
	pub params: Params,
}
impl FetchRequest {
	/// The endpoint with `params` appended as search string.
	#[must_use]
	pub fn url(&self) -> String {
		let query = encode(&self.params);
		if query.is_empty() {
			self.endpoint.clone()
		} else {
			let separator = if self.endpoint.contains('?') { '&' } else { '?' };
			format!("{}{}{}", self.endpoint, separator, query)
		}
	}
}

/// The HTTP capability.
///
/// Once a dispatched request settles, the implementation hands the outcome to
/// [`ListSearch::resolve`](`crate::ListSearch::resolve`) together with the request's token.
/// That must happen asynchronously, never from within [`dispatch`](`Transport::dispatch`) or [`abort`](`Transport::abort`).
///
/// Stale outcomes are discarded by the coordinator, so [`abort`](`Transport::abort`) is an optimization and may be a no-op.
pub trait Transport {
	fn dispatch(&mut self, request: FetchRequest);
	fn abort(&mut self, token: RequestToken);
}
