use crate::http::{header, Body, HeaderValue, Method, Request, Response, StatusCode};
use crate::state;
use crate::template::{Locals, Renderer};
use crate::wrap::{Next, Unit};
use crate::Context;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Runs requests through a frozen middleware chain.
///
/// Created with [`Gantry::build`](crate::Gantry::build). Everything a
/// dispatcher holds is read-only, so it can be cloned cheaply and shared
/// across any number of concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    units: Vec<Unit>,
    shared: Arc<Shared>,
    hang_timeout: Duration,
}

/// Process-wide state visible to every request.
pub(crate) struct Shared {
    pub globals: Locals,
    pub renderer: Renderer,
    pub state: state::Map,
}

impl Dispatcher {
    pub(crate) fn new(units: Vec<Unit>, shared: Shared, hang_timeout: Duration) -> Self {
        Dispatcher {
            inner: Arc::new(Inner {
                units,
                shared: Arc::new(shared),
                hang_timeout,
            }),
        }
    }

    /// Run a request through the chain and return the finalized response.
    ///
    /// - If no unit finalizes the response and every unit passes control
    ///   on, the response is `404 Not Found`, or `405 Method Not Allowed`
    ///   if a router with that option enabled had routes for the path
    ///   under other methods.
    /// - If a rejection is never recovered, the response is
    ///   `500 Internal Server Error`.
    /// - If no unit advances the chain within the hang timeout, the
    ///   response is `504 Gateway Timeout`.
    pub async fn dispatch(&self, req: http::Request<Body>) -> Response {
        let mut cx = Context::new(Request::from(req), self.inner.shared.clone());
        let timeout = self.inner.hang_timeout;
        let watchdog = Watchdog::new();

        tracing::debug!(method = %cx.method(), path = cx.path(), "dispatching request");

        let mut hung = {
            let traversal = Next::new(&self.inner.units, &watchdog).run(&mut cx);
            tokio::pin!(traversal);

            loop {
                tokio::select! {
                    () = &mut traversal => break false,
                    () = tokio::time::sleep_until(watchdog.deadline(timeout)) => {
                        if watchdog.expired(timeout) {
                            break true;
                        }
                    }
                }
            }
        };

        if !hung && !cx.response().is_finalized() && !cx.exhausted {
            // a unit returned without continuing or finalizing,
            // so nothing will ever advance the chain again
            tokio::time::sleep_until(watchdog.deadline(timeout)).await;
            hung = true;
        }

        let allowed = cx
            .allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let res = cx.response_mut();

        if hung {
            if res.fail(StatusCode::GATEWAY_TIMEOUT) {
                tracing::warn!(?timeout, "request hung, no unit advanced the chain");
            }
        } else if !allowed.is_empty() {
            if res.fail(StatusCode::METHOD_NOT_ALLOWED) {
                tracing::debug!(%allowed, "no route for this method");
                if let Ok(value) = HeaderValue::from_str(&allowed) {
                    res.headers_mut().insert(header::ALLOW, value);
                }
            }
        } else if res.fail(StatusCode::NOT_FOUND) {
            tracing::debug!("no unit finalized the response");
        }

        tracing::debug!(status = %cx.response().status(), "request finished");
        cx.into_response()
    }

    /// Like [`dispatch`](Dispatcher::dispatch), but abandons the request
    /// as soon as `closed` resolves.
    ///
    /// Abandoning drops the in-flight traversal: no unit is invoked
    /// afterwards and `None` is returned.
    pub async fn dispatch_until<F>(&self, req: http::Request<Body>, closed: F) -> Option<Response>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            res = self.dispatch(req) => Some(res),
            () = closed => {
                tracing::debug!("connection closed, abandoning request");
                None
            }
        }
    }
}

/// Tracks when the chain last made progress.
pub(crate) struct Watchdog {
    start: Instant,
    last: AtomicU64,
}

impl Watchdog {
    fn new() -> Self {
        Watchdog {
            start: Instant::now(),
            last: AtomicU64::new(0),
        }
    }

    /// Record progress.
    pub(crate) fn touch(&self) {
        let elapsed = self.start.elapsed().as_millis() as u64;
        self.last.fetch_max(elapsed, Ordering::Relaxed);
    }

    fn deadline(&self, timeout: Duration) -> Instant {
        self.start + Duration::from_millis(self.last.load(Ordering::Relaxed)) + timeout
    }

    fn expired(&self, timeout: Duration) -> bool {
        Instant::now() >= self.deadline(timeout)
    }
}
