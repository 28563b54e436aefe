use http::StatusCode;

use std::any::Any;
use std::fmt::{self, Debug, Display};

/// An error capable of failing a request.
///
/// A rejection travels down the middleware chain to the nearest
/// error handling unit. If none recovers it, the request fails with
/// `500 Internal Server Error` regardless of [`status`](Reject::status).
pub trait Reject: Debug + Display + Send + Sync + 'static {
    /// The status an error handling unit should respond with.
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl Reject for StatusCode {
    fn status(&self) -> StatusCode {
        *self
    }
}

/// A dynamically typed rejection.
pub struct Rejection {
    inner: Box<dyn BoxedReject>,
}

impl Rejection {
    /// Create a new `Rejection`.
    pub fn new<E>(err: E) -> Self
    where
        E: Reject,
    {
        Rejection {
            inner: Box::new(err),
        }
    }

    /// Reject with any error type and the given status.
    pub fn with_status<E>(status: StatusCode, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Rejection::new(WithStatus { status, err })
    }

    /// Reject with any error type as an internal server error.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Rejection::with_status(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// The status suggested by the underlying error.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Attempt to downcast to the underlying error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Reject,
    {
        self.inner.as_any().downcast_ref()
    }
}

trait BoxedReject: Reject {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Reject> BoxedReject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl<E> From<E> for Rejection
where
    E: Reject,
{
    fn from(err: E) -> Self {
        Rejection::new(err)
    }
}

#[derive(Debug)]
struct WithStatus<E> {
    status: StatusCode,
    err: E,
}

impl<E: Display> Display for WithStatus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.err, f)
    }
}

impl<E> Reject for WithStatus<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn status(&self) -> StatusCode {
        self.status
    }
}
