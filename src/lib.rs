//! Date-indexed query engine over cached campus event and tour listings.
//!
//! A snapshot's record list is grouped into date buckets once
//! ([`index::build`]); a [`QueryEngine`] then narrows a working view with
//! filters that only ever remove records, so they can be applied in any order.

pub mod engine;
pub mod error;
pub mod filter;
pub mod index;
pub mod logging;
pub mod request;
pub mod snapshot;
pub mod vertical;

pub use engine::QueryEngine;
pub use error::{Error, Result};
pub use filter::{DateSegment, Filter};
pub use index::{Collection, DateBucket, Record};
pub use request::{QueryRequest, Response};
pub use vertical::{Config, DateOrder, Vertical};
