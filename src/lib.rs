//! A small web framework built around an ordered middleware chain,
//! pattern routing, and HTML templates with layered variable scopes.

mod bounded;
mod context;
mod dispatch;
mod gantry;
mod reject;
mod respond;
mod state;

pub mod config;
pub mod handler;
pub mod http;
pub mod router;
pub mod template;
pub mod wrap;

pub use async_trait::async_trait;
pub use bounded::{BoxError, BoxFuture};
pub use config::{Config, ConfigError};
pub use context::Context;
pub use dispatch::Dispatcher;
pub use gantry::Gantry;
pub use handler::{endpoint_fn, Endpoint};
pub use crate::http::{Finalized, Request, Response};
pub use reject::{Reject, Rejection};
pub use respond::{Html, Json, Respond};
pub use router::{RouteError, Router};
pub use state::State;
pub use template::{Locals, TemplateError};
pub use wrap::{middleware_fn, recover_fn, Middleware, Next, PathFilter, Recover, Unit};
