use super::{Middleware, Next, Recover};
use crate::bounded::BoxFuture;
use crate::{Context, Rejection};

/// Create middleware from a closure.
///
/// ```rust
/// use gantry::{middleware_fn, Gantry};
///
/// let app = Gantry::new().wrap(middleware_fn(|cx, next| {
///     Box::pin(async move {
///         cx.locals_mut().insert("year", 2024);
///         next.run(cx).await;
///         Ok(())
///     })
/// }));
/// ```
pub fn middleware_fn<F>(f: F) -> impl Middleware
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), Rejection>>
        + Send
        + Sync
        + 'static,
{
    struct Impl<F>(F);

    #[async_trait::async_trait]
    impl<F> Middleware for Impl<F>
    where
        F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), Rejection>>
            + Send
            + Sync
            + 'static,
    {
        async fn call(&self, cx: &mut Context, next: Next<'_>) -> Result<(), Rejection> {
            (self.0)(cx, next).await
        }
    }

    Impl(f)
}

/// Create an error handling unit from a closure.
///
/// ```rust
/// use gantry::{recover_fn, Gantry};
///
/// let app = Gantry::new().recover(recover_fn(|err, cx, _next| {
///     Box::pin(async move {
///         cx.send((err.status(), format!("something went wrong: {}", err)))?;
///         Ok::<_, gantry::Rejection>(())
///     })
/// }));
/// ```
pub fn recover_fn<F>(f: F) -> impl Recover
where
    F: for<'a> Fn(Rejection, &'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), Rejection>>
        + Send
        + Sync
        + 'static,
{
    struct Impl<F>(F);

    #[async_trait::async_trait]
    impl<F> Recover for Impl<F>
    where
        F: for<'a> Fn(Rejection, &'a mut Context, Next<'a>) -> BoxFuture<'a, Result<(), Rejection>>
            + Send
            + Sync
            + 'static,
    {
        async fn call(
            &self,
            err: Rejection,
            cx: &mut Context,
            next: Next<'_>,
        ) -> Result<(), Rejection> {
            (self.0)(err, cx, next).await
        }
    }

    Impl(f)
}
