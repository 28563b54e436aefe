use crate::dispatch::Shared;
use crate::http::{HeaderMap, Method, Params, Request, Response};
use crate::respond::{Html, Respond};
use crate::state::State;
use crate::template::{Locals, ScopeSet, TemplateError};
use crate::{Finalized, Rejection};

use std::sync::Arc;

/// Everything about a single request in flight.
///
/// A context is created by the [`Dispatcher`](crate::Dispatcher) for every
/// inbound request and handed by mutable reference to each middleware unit
/// and endpoint in turn. It owns the request, the response being written,
/// and the request-global template variables.
pub struct Context {
    request: Request,
    response: Response,
    locals: Locals,
    shared: Arc<Shared>,
    pub(crate) base: usize,
    pub(crate) exhausted: bool,
    /// Methods that routers passed over had routes for at this path.
    pub(crate) allowed: Vec<Method>,
}

impl Context {
    pub(crate) fn new(request: Request, shared: Arc<Shared>) -> Self {
        Context {
            request,
            response: Response::new(),
            locals: Locals::new(),
            shared,
            base: 0,
            exhausted: false,
            allowed: Vec::new(),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The full request path.
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// The request path relative to where the current unit is mounted.
    ///
    /// For a unit mounted at `/speakers`, a request for `/speakers/alice`
    /// has the route path `/alice`.
    pub fn route_path(&self) -> &str {
        match &self.path()[self.base..] {
            "" => "/",
            path => path,
        }
    }

    /// Route parameters captured by the matched route.
    pub fn params(&self) -> &Params {
        self.request.params()
    }

    /// A single route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// A query string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query(name)
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// The request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the request.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The response being written.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Write a body and finalize the response.
    pub fn send(&mut self, body: impl Respond) -> Result<(), Finalized> {
        self.response.send(body)
    }

    /// Variables shared by every template rendered during this request.
    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    /// Mutable access to the request-global template variables.
    pub fn locals_mut(&mut self) -> &mut Locals {
        &mut self.locals
    }

    /// Variables configured for the whole process.
    pub fn globals(&self) -> &Locals {
        &self.shared.globals
    }

    /// Application state injected with [`Gantry::inject`](crate::Gantry::inject).
    pub fn state<T: State>(&self) -> Option<&T> {
        self.shared.state.get::<T>()
    }

    /// Render a template with the given call-local variables.
    pub async fn render(&self, id: &str, locals: Locals) -> Result<String, TemplateError> {
        let scopes = ScopeSet {
            call: &locals,
            request: &self.locals,
            process: &self.shared.globals,
        };

        self.shared.renderer.render(id, &scopes).await
    }

    /// Render a template and send it as an HTML response.
    pub async fn render_page(&mut self, id: &str, locals: Locals) -> Result<(), Rejection> {
        let html = self.render(id, locals).await?;
        self.response.send(Html(html))?;
        Ok(())
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}
