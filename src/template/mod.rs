//! Layered HTML templates.
//!
//! Templates use Jinja syntax, rendered by [`minijinja`]:
//!
//! - `{{ path }}` embeds a variable, HTML-escaped.
//! - `{{ path|safe }}` embeds a variable without escaping.
//! - `{% include "id" %}` embeds another rendered template as-is.
//! - `{% if path %} ... {% else %} ... {% endif %}` renders conditionally.
//!   A missing variable is falsy.
//! - `{% for item in path %} ... {% endfor %}` repeats over a sequence.
//! - `{# ... #}` is a comment.
//!
//! Embedding a variable that is not defined fails the render.
//! Variables resolve through a [`ScopeSet`].

mod scope;
mod source;

pub use scope::{Locals, ScopeSet};
pub use source::{DirSource, MemorySource, TemplateSource};

use crate::http::StatusCode;
use crate::reject::Reject;

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

/// An error returned by [`Renderer::render`].
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template id did not resolve to a template.
    #[error("template `{0}` not found")]
    NotFound(String),
    /// The template was found but could not be rendered.
    #[error("failed to render template `{template}`: {reason}")]
    Render {
        /// The template that failed.
        template: String,
        /// Why it failed.
        #[source]
        reason: minijinja::Error,
    },
    /// The template source could not be read.
    #[error("failed to load template `{template}`")]
    Load {
        /// The template being loaded.
        template: String,
        #[source]
        source: io::Error,
    },
}

impl Reject for TemplateError {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Renders templates loaded from a [`TemplateSource`].
#[derive(Clone)]
pub struct Renderer {
    source: Arc<dyn TemplateSource>,
}

impl Renderer {
    /// Create a renderer over a template source.
    pub fn new(source: impl TemplateSource) -> Self {
        Renderer {
            source: Arc::new(source),
        }
    }

    /// Render a template to an HTML string.
    ///
    /// Included templates are loaded from the source as rendering reaches
    /// them, so an include in a branch that never renders is never loaded.
    pub async fn render(&self, id: &str, scopes: &ScopeSet<'_>) -> Result<String, TemplateError> {
        let context = scopes.flatten();
        let mut texts = HashMap::new();
        let mut pending = vec![id.to_owned()];

        loop {
            for name in pending.drain(..) {
                let text = self
                    .source
                    .load(&name)
                    .await
                    .map_err(|source| TemplateError::Load {
                        template: name.clone(),
                        source,
                    })?;

                texts.insert(name, text);
            }

            if let Some(None) = texts.get(id) {
                return Err(TemplateError::NotFound(id.to_owned()));
            }

            let loaded = Arc::new(Loaded {
                texts: texts.clone(),
                missed: Mutex::default(),
            });

            let result = environment(loaded.clone())
                .get_template(id)
                .and_then(|template| template.render(&context));

            match result {
                Ok(html) => return Ok(html),
                Err(reason) => {
                    pending = loaded.take_missed();

                    if pending.is_empty() {
                        return Err(TemplateError::Render {
                            template: id.to_owned(),
                            reason,
                        });
                    }

                    tracing::trace!(?pending, "loading included templates");
                }
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(MemorySource::new())
    }
}

/// Template text fetched so far for a single render.
struct Loaded {
    texts: HashMap<String, Option<String>>,
    missed: Mutex<Vec<String>>,
}

impl Loaded {
    fn get(&self, name: &str) -> Option<String> {
        match self.texts.get(name) {
            Some(text) => text.clone(),
            None => {
                if let Ok(mut missed) = self.missed.lock() {
                    missed.push(name.to_owned());
                }
                None
            }
        }
    }

    fn take_missed(&self) -> Vec<String> {
        match self.missed.lock() {
            Ok(mut missed) => std::mem::take(&mut *missed),
            Err(_) => Vec::new(),
        }
    }
}

fn environment(loaded: Arc<Loaded>) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_keep_trailing_newline(true);
    env.set_loader(move |name| Ok(loaded.get(name)));
    env
}
