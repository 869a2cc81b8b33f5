#![doc(html_root_url = "https://docs.rs/list-search/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod codec;
pub mod debounce;
pub mod list;
pub mod options;
pub mod pagination;
pub mod query;
pub mod result;
pub mod sequence;
pub mod transport;
pub mod url_sync;
pub mod validation;
pub mod web;

pub use codec::{decode, encode, Params, Value};
pub use debounce::Timer;
pub use list::{Dispatch, ListEvent, ListSearch, RequestType, Services};
pub use options::Options;
pub use pagination::{PageTarget, PaginationType};
pub use query::{Cursor, Facets, Initial, QueryState};
pub use result::{FacetDescriptor, PageInfo, ResultPage, ResultState};
pub use sequence::{RequestToken, TimerId};
pub use transport::{FetchError, FetchRequest, Transport};
pub use url_sync::{Detached, Location, MemoryLocation, UrlMirror};
pub use validation::{Validation, ValidationGate};
