//! The middleware chain.

mod wrap_fn;

pub use wrap_fn::{middleware_fn, recover_fn};

use crate::dispatch::Watchdog;
use crate::http::Method;
use crate::{Context, Rejection};

use std::fmt;
use std::sync::Arc;

/// A step in the middleware chain.
///
/// ```rust
/// use gantry::{async_trait, Context, Middleware, Next, Rejection};
///
/// struct Logger;
///
/// #[async_trait]
/// impl Middleware for Logger {
///     async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
///         let start = std::time::Instant::now();
///         next.run(cx).await;
///         tracing::info!(path = cx.path(), elapsed = ?start.elapsed(), "handled request");
///         Ok(())
///     }
/// }
/// ```
///
/// A unit either finalizes the response, continues with [`Next::run`], or
/// fails with a [`Rejection`]. A unit that does none of these leaves the
/// request hanging until the dispatcher's hang timeout expires.
#[async_trait::async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handle the request, optionally passing control to the next unit.
    async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection>;
}

/// A step in the middleware chain that handles errors.
///
/// Error units are skipped during normal processing. When a unit fails,
/// control jumps to the nearest error unit after it, skipping any normal
/// units in between. An error unit recovers by finalizing the response,
/// resumes normal processing by calling [`Next::run`], or passes the error
/// on by returning it.
#[async_trait::async_trait]
pub trait Recover: Send + Sync + 'static {
    /// Handle a rejection raised earlier in the chain.
    async fn call(&self, err: Rejection, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection>;
}

/// The handler of a [`Unit`].
#[derive(Clone)]
pub enum Handler {
    /// Runs during normal processing.
    Normal(Arc<dyn Middleware>),
    /// Runs only while an error is being handled.
    Error(Arc<dyn Recover>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Normal(_) => f.write_str("Normal"),
            Handler::Error(_) => f.write_str("Error"),
        }
    }
}

/// Restricts a [`Unit`] to certain request paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilter {
    /// Matches a single path. A trailing slash is ignored.
    Exact(String),
    /// Matches a path and everything below it, on segment boundaries:
    /// `/speakers` matches `/speakers` and `/speakers/alice`,
    /// but not `/speakersalice`.
    Prefix(String),
}

impl PathFilter {
    /// Returns the length of the matched mount point, if the path matches.
    ///
    /// Leading and trailing slashes on the filter are ignored, so
    /// `speakers`, `/speakers` and `/speakers/` are the same filter.
    fn matches(&self, path: &str) -> Option<usize> {
        match self {
            PathFilter::Exact(exact) => {
                (path.trim_matches('/') == exact.trim_matches('/')).then(|| 0)
            }
            PathFilter::Prefix(prefix) => {
                let prefix = prefix.trim_matches('/');
                if prefix.is_empty() {
                    return Some(0);
                }

                let rest = path.strip_prefix('/')?.strip_prefix(prefix)?;
                (rest.is_empty() || rest.starts_with('/')).then(|| prefix.len() + 1)
            }
        }
    }
}

/// A registered middleware unit: a handler and the requests it applies to.
#[derive(Debug, Clone)]
pub struct Unit {
    path: Option<PathFilter>,
    method: Option<Method>,
    handler: Handler,
}

impl Unit {
    /// A normal unit that applies to every request.
    pub fn new(middleware: impl Middleware) -> Self {
        Unit {
            path: None,
            method: None,
            handler: Handler::Normal(Arc::new(middleware)),
        }
    }

    /// An error unit that applies to every request.
    pub fn recover(recover: impl Recover) -> Self {
        Unit {
            path: None,
            method: None,
            handler: Handler::Error(Arc::new(recover)),
        }
    }

    /// Only apply this unit to matching paths.
    pub fn path(mut self, filter: PathFilter) -> Self {
        self.path = Some(filter);
        self
    }

    /// Only apply this unit to requests with the given method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// The unit's handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns the mount point length if this unit applies to the request.
    fn applies(&self, method: &Method, path: &str) -> Option<usize> {
        if matches!(&self.method, Some(m) if m != method) {
            return None;
        }

        match &self.path {
            Some(filter) => filter.matches(path),
            None => Some(0),
        }
    }
}

/// The continuation passed to each unit.
///
/// Calling [`run`](Next::run) passes control to the remaining units in the
/// chain. Once it returns, the rest of the chain has finished with the
/// request.
pub struct Next<'a> {
    units: &'a [Unit],
    watchdog: &'a Watchdog,
}

impl<'a> Next<'a> {
    pub(crate) fn new(units: &'a [Unit], watchdog: &'a Watchdog) -> Self {
        Next { units, watchdog }
    }

    /// Run the rest of the chain.
    pub async fn run(self, cx: &mut Context) {
        let base = cx.base;
        self.drive(cx, None).await;
        cx.base = base;
    }

    async fn drive(self, cx: &mut Context, mut error: Option<Rejection>) {
        let mut rest = self.units;
        self.watchdog.touch();

        loop {
            if cx.response().is_finalized() {
                if let Some(err) = error {
                    tracing::warn!(error = %err, "unit failed after the response was finalized");
                }
                return;
            }

            let (unit, tail) = match rest.split_first() {
                Some(split) => split,
                None => break,
            };
            rest = tail;

            let base = match unit.applies(cx.method(), cx.path()) {
                Some(base) => base,
                None => continue,
            };

            let next = Next::new(tail, self.watchdog);
            let result = match (&unit.handler, error.take()) {
                (Handler::Normal(middleware), None) => {
                    cx.base = base;
                    middleware.call(cx, next).await
                }
                (Handler::Error(recover), Some(err)) => {
                    tracing::debug!(error = %err, "routing rejection to error unit");
                    cx.base = base;
                    recover.call(err, cx, next).await
                }
                (_, pending) => {
                    error = pending;
                    continue;
                }
            };

            self.watchdog.touch();

            match result {
                Ok(()) => return,
                Err(err) => error = Some(err),
            }
        }

        match error {
            Some(err) => {
                tracing::error!(error = %err, path = cx.path(), "unhandled rejection");
                cx.response_mut().fail(http::StatusCode::INTERNAL_SERVER_ERROR);
            }
            None => cx.exhausted = true,
        }
    }
}
