use std::borrow::Cow;

use crate::http::{header, Bytes, HeaderValue, Response, StatusCode};

use mime::Mime;

/// A type that can be written into a [`Response`].
///
/// See [`Response::send`].
pub trait Respond {
    /// Write status, headers and body into the response.
    fn respond(self, res: &mut Response);

    /// Returns a new responder that adds the provided status
    /// code to the response.
    fn with_status(self, status: StatusCode) -> (StatusCode, Self)
    where
        Self: Sized,
    {
        (status, self)
    }
}

impl Respond for () {
    fn respond(self, _: &mut Response) {}
}

impl Respond for StatusCode {
    fn respond(self, res: &mut Response) {
        *res.status_mut() = self;
    }
}

impl<T> Respond for (StatusCode, T)
where
    T: Respond,
{
    fn respond(self, res: &mut Response) {
        self.1.respond(res);
        *res.status_mut() = self.0;
    }
}

/// An HTML response body.
#[derive(Debug, Clone)]
pub struct Html<T>(pub T);

impl<T> Respond for Html<T>
where
    T: Into<Bytes>,
{
    fn respond(self, res: &mut Response) {
        content(res, mime::TEXT_HTML_UTF_8, self.0.into());
    }
}

/// A JSON response body.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T> Respond for Json<T>
where
    T: serde::Serialize,
{
    fn respond(self, res: &mut Response) {
        match serde_json::to_vec(&self.0) {
            Ok(body) => content(res, mime::APPLICATION_JSON, body.into()),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize json response");
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }
}

fn content(res: &mut Response, content_type: Mime, body: Bytes) {
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        res.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    res.set_body(body);
}

macro_rules! with_content_type {
    ($($ty:ty $(|$into:ident)? => $content_type:expr),* $(,)?) => { $(
        impl Respond for $ty {
            fn respond(self, res: &mut Response) {
                content(res, $content_type, Bytes::from(self $(.$into())?));
            }
        })*
    }
}

with_content_type! {
    Bytes => mime::APPLICATION_OCTET_STREAM,
    Vec<u8> => mime::APPLICATION_OCTET_STREAM,
    &'static [u8] => mime::APPLICATION_OCTET_STREAM,
    Cow<'static, [u8]> | into_owned => mime::APPLICATION_OCTET_STREAM,
    String => mime::TEXT_PLAIN_UTF_8,
    &'static str => mime::TEXT_PLAIN_UTF_8,
    Cow<'static, str> | into_owned => mime::TEXT_PLAIN_UTF_8,
}
