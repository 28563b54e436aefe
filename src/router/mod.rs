//! Method and pattern based routing.

mod pattern;

pub use pattern::{Pattern, RouteError};

use crate::handler::Endpoint;
use crate::http::{Method, Params};
use crate::wrap::{Middleware, Next};
use crate::{Context, Rejection};

use std::sync::Arc;

/// An ordered list of routes.
///
/// Routes are tried in the order they were registered; the first route
/// whose method and pattern both match the request wins. A router is
/// itself a [`Middleware`]: when no route matches, it passes the request
/// on to the next unit in the chain.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
    method_not_allowed: bool,
}

#[derive(Clone)]
struct Route {
    method: Method,
    pattern: Pattern,
    endpoint: Arc<dyn Endpoint>,
}

/// A route selected by [`Router::match_route`].
pub struct Match<'r> {
    /// The matched pattern.
    pub pattern: &'r Pattern,
    /// The endpoint registered for the route.
    pub endpoint: &'r dyn Endpoint,
    /// Parameters captured from the path.
    pub params: Params,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route.
    ///
    /// Fails if the pattern is malformed.
    pub fn route(
        mut self,
        method: Method,
        pattern: &str,
        endpoint: impl Endpoint,
    ) -> Result<Self, RouteError> {
        self.insert(method, pattern, Arc::new(endpoint))?;
        Ok(self)
    }

    pub(crate) fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: Arc<dyn Endpoint>,
    ) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        tracing::trace!(%method, %pattern, "registered route");

        self.routes.push(Route {
            method,
            pattern,
            endpoint,
        });

        Ok(())
    }

    /// Respond with `405 Method Not Allowed` when the path matches
    /// a route registered for a different method.
    ///
    /// The request still passes on to the next unit, so a later router
    /// may handle it. The 405 is only sent if the chain runs out without
    /// finalizing a response. By default, such requests end in a 404.
    pub fn method_not_allowed(mut self, enabled: bool) -> Self {
        self.method_not_allowed = enabled;
        self
    }

    /// Find the first route matching a method and path.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<Match<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.pattern.matches(path).map(|params| Match {
                    pattern: &route.pattern,
                    endpoint: &*route.endpoint,
                    params,
                })
            })
    }

    /// The methods with a route matching the given path, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            if !allowed.contains(&route.method) && route.pattern.matches(path).is_some() {
                allowed.push(route.method.clone());
            }
        }

        allowed
    }

    /// The number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

macro_rules! insert_route {
    ($name:ident => Method::$method:ident) => {
        #[doc = concat!("Insert a route for the `", stringify!($method), "` method.")]
        pub fn $name(self, pattern: &str, endpoint: impl Endpoint) -> Result<Self, RouteError> {
            self.route(Method::$method, pattern, endpoint)
        }
    };
}

impl Router {
    insert_route!(get => Method::GET);
    insert_route!(put => Method::PUT);
    insert_route!(post => Method::POST);
    insert_route!(delete => Method::DELETE);
    insert_route!(head => Method::HEAD);
    insert_route!(options => Method::OPTIONS);
    insert_route!(patch => Method::PATCH);
}

#[async_trait::async_trait]
impl Middleware for Router {
    async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
        if let Some(matched) = self.match_route(cx.method(), cx.route_path()) {
            tracing::debug!(pattern = %matched.pattern, path = cx.path(), "matched route");
            cx.request_mut().params = matched.params;
            return matched.endpoint.call(cx).await;
        }

        if self.method_not_allowed {
            for method in self.allowed_methods(cx.route_path()) {
                if !cx.allowed.contains(&method) {
                    cx.allowed.push(method);
                }
            }
        }

        next.run(cx).await;
        Ok(())
    }
}
