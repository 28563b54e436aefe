use std::any::type_name;

/// Values that can be injected as application state.
pub trait State: Send + Sync + 'static {}
impl<T> State for T where T: Send + Sync + 'static {}

/// Typed application state, keyed by type.
///
/// State is injected while building the application with
/// [`Gantry::inject`](crate::Gantry::inject) and is read-only afterwards.
#[derive(Default)]
pub(crate) struct Map(http::Extensions);

impl Map {
    pub fn get<T: State>(&self) -> Option<&T> {
        self.0.get::<T>()
    }

    pub fn insert<T: State>(&mut self, state: T) {
        if self.0.insert(state).is_some() {
            tracing::debug!(ty = type_name::<T>(), "replaced injected state");
        }
    }
}
