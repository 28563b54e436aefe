use crate::reject::Reject;
use crate::respond::Respond;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

/// The outbound reply to a request.
///
/// A response is written by middleware and handlers until it is
/// finalized, usually through [`send`](Response::send). Once finalized,
/// every further write fails with [`Finalized`].
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    finalized: bool,
}

/// The error returned when writing to a finalized [`Response`].
#[derive(Debug, thiserror::Error)]
#[error("response has already been finalized")]
pub struct Finalized;

impl Reject for Finalized {}

impl Response {
    pub(crate) fn new() -> Self {
        Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            finalized: false,
        }
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body written so far.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` once the response can no longer be written to.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) -> Result<&mut Self, Finalized> {
        self.writable()?.status = status;
        Ok(self)
    }

    /// Insert a header, replacing any previous values.
    pub fn insert_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<&mut Self, Finalized> {
        self.writable()?.headers.insert(name, value);
        Ok(self)
    }

    /// Append a header value, keeping previous values.
    pub fn append_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<&mut Self, Finalized> {
        self.writable()?.headers.append(name, value);
        Ok(self)
    }

    /// Write a body and finalize the response.
    pub fn send(&mut self, body: impl Respond) -> Result<(), Finalized> {
        self.writable()?;
        body.respond(self);
        self.finalized = true;
        Ok(())
    }

    /// Finalize the response with an empty body and the given status.
    pub fn end(&mut self, status: StatusCode) -> Result<(), Finalized> {
        self.send(status)
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    /// Finalize with a bare status, discarding anything written so far.
    ///
    /// Returns `false` without touching the response if it was
    /// already finalized.
    pub(crate) fn fail(&mut self, status: StatusCode) -> bool {
        if self.finalized {
            return false;
        }

        *self = Response::new();
        self.status = status;
        self.finalized = true;
        true
    }

    /// Convert into an [`http::Response`].
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut res = http::Response::new(self.body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }

    fn writable(&mut self) -> Result<&mut Self, Finalized> {
        if self.finalized {
            Err(Finalized)
        } else {
            Ok(self)
        }
    }
}
