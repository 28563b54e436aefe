//! Terminal request handlers.

use crate::bounded::BoxFuture;
use crate::{Context, Rejection};

/// An asynchronous handler selected by a [`Router`](crate::Router).
///
/// An endpoint is expected to finalize the response. An endpoint that
/// returns without doing so leaves the request hanging.
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Handle the request.
    async fn call(&self, cx: &mut Context) -> Result<(), Rejection>;
}

/// Create an endpoint from a closure.
///
/// ```rust
/// use gantry::{endpoint_fn, Context, Rejection};
///
/// async fn speaker(cx: &mut Context) -> Result<(), Rejection> {
///     let name = cx.param("name").unwrap_or("everyone").to_owned();
///     cx.send(format!("Hello, {}!", name))?;
///     Ok(())
/// }
///
/// let endpoint = endpoint_fn(|cx| Box::pin(speaker(cx)));
/// ```
pub fn endpoint_fn<F>(f: F) -> impl Endpoint
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), Rejection>> + Send + Sync + 'static,
{
    struct Impl<F>(F);

    #[async_trait::async_trait]
    impl<F> Endpoint for Impl<F>
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), Rejection>>
            + Send
            + Sync
            + 'static,
    {
        async fn call(&self, cx: &mut Context) -> Result<(), Rejection> {
            (self.0)(cx).await
        }
    }

    Impl(f)
}
