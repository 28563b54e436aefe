use crate::config::Config;
use crate::dispatch::{Dispatcher, Shared};
use crate::handler::Endpoint;
use crate::http::Method;
use crate::router::{RouteError, Router};
use crate::state::{self, State};
use crate::template::{DirSource, Locals, Renderer, TemplateSource};
use crate::wrap::{Middleware, PathFilter, Recover, Unit};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Builds an application.
///
/// Units run in the order they are registered. Routes registered directly
/// on the application with [`route`](Gantry::route) and its shorthands run
/// at the position of the chain where they were registered.
///
/// ```rust
/// use gantry::{endpoint_fn, Gantry, Html};
///
/// # fn main() -> Result<(), gantry::RouteError> {
/// let dispatcher = Gantry::new()
///     .global("siteName", "ROUX Meetups")
///     .get("/", endpoint_fn(|cx| Box::pin(async move {
///         cx.send(Html("<h1>Welcome</h1>"))?;
///         Ok::<_, gantry::Rejection>(())
///     })))?
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct Gantry {
    units: Vec<Unit>,
    routes: Option<Router>,
    globals: Locals,
    state: state::Map,
    renderer: Renderer,
    hang_timeout: Duration,
    method_not_allowed: bool,
}

impl Gantry {
    /// Create an empty application.
    pub fn new() -> Self {
        Gantry {
            units: Vec::new(),
            routes: None,
            globals: Locals::new(),
            state: state::Map::default(),
            renderer: Renderer::default(),
            hang_timeout: Config::default().hang_timeout(),
            method_not_allowed: false,
        }
    }

    /// Apply configuration.
    ///
    /// Globals from the configuration are merged into any already set,
    /// and a `views` directory replaces the current template source.
    /// `method_not_allowed` applies to each router when it joins the
    /// chain: routes registered on the application join at the next
    /// [`wrap`](Gantry::wrap), [`mount`](Gantry::mount) or
    /// [`build`](Gantry::build), while [`nest`](Gantry::nest) takes the
    /// setting current at the time of the call.
    pub fn configure(mut self, config: Config) -> Self {
        self.hang_timeout = config.hang_timeout();
        self.method_not_allowed = config.method_not_allowed;

        self.globals.extend(config.globals);

        if let Some(views) = config.views {
            self.renderer = Renderer::new(DirSource::new(views).extension(config.view_extension));
        }

        self
    }

    /// Append a middleware unit that applies to every request.
    pub fn wrap(self, middleware: impl Middleware) -> Self {
        self.mount(Unit::new(middleware))
    }

    /// Append a middleware unit that applies to matching paths.
    pub fn wrap_at(self, filter: PathFilter, middleware: impl Middleware) -> Self {
        self.mount(Unit::new(middleware).path(filter))
    }

    /// Append an error handling unit.
    pub fn recover(self, recover: impl Recover) -> Self {
        self.mount(Unit::recover(recover))
    }

    /// Append a unit.
    pub fn mount(mut self, unit: Unit) -> Self {
        self.flush_routes();
        self.units.push(unit);
        self
    }

    /// Mount a router under a path prefix.
    ///
    /// The router matches patterns against the path below the prefix,
    /// so a route for `/:name` mounted at `/speakers` serves `/speakers/alice`.
    pub fn nest(self, prefix: impl Into<String>, router: Router) -> Self {
        let router = router.method_not_allowed(self.method_not_allowed);
        self.mount(Unit::new(router).path(PathFilter::Prefix(prefix.into())))
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
        self.routes
            .get_or_insert_with(Router::new)
            .insert(method, pattern, Arc::new(endpoint))?;
        Ok(self)
    }

    /// Set a process-wide template variable.
    pub fn global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name, value);
        self
    }

    /// Inject application state, available through [`Context::state`](crate::Context::state).
    pub fn inject<T>(mut self, state: T) -> Self
    where
        T: State,
    {
        self.state.insert(state);
        self
    }

    /// Load templates from the given source.
    pub fn templates(mut self, source: impl TemplateSource) -> Self {
        self.renderer = Renderer::new(source);
        self
    }

    /// How long a request may go without progress before it times out.
    pub fn hang_timeout(mut self, timeout: Duration) -> Self {
        self.hang_timeout = timeout;
        self
    }

    /// Freeze the application into a [`Dispatcher`].
    pub fn build(mut self) -> Dispatcher {
        self.flush_routes();

        tracing::debug!(units = self.units.len(), "built dispatcher");

        Dispatcher::new(
            self.units,
            Shared {
                globals: self.globals,
                renderer: self.renderer,
                state: self.state,
            },
            self.hang_timeout,
        )
    }

    fn flush_routes(&mut self) {
        if let Some(router) = self.routes.take() {
            let router = router.method_not_allowed(self.method_not_allowed);
            self.units.push(Unit::new(router));
        }
    }
}

impl Default for Gantry {
    fn default() -> Self {
        Gantry::new()
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

impl Gantry {
    insert_route!(get => Method::GET);
    insert_route!(put => Method::PUT);
    insert_route!(post => Method::POST);
    insert_route!(delete => Method::DELETE);
    insert_route!(head => Method::HEAD);
    insert_route!(options => Method::OPTIONS);
    insert_route!(patch => Method::PATCH);
}
