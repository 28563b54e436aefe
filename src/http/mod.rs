//! HTTP types.

mod body;
mod request;
mod response;

pub use body::Body;
pub use request::{Params, Request};
pub use response::{Finalized, Response};

pub use bytes::Bytes;
pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
