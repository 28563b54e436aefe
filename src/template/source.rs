use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves template identifiers to template text.
///
/// Sources are read-only lookups shared by every request.
#[async_trait::async_trait]
pub trait TemplateSource: Send + Sync + 'static {
    /// Load the text of a template, or `None` if no such template exists.
    async fn load(&self, id: &str) -> io::Result<Option<String>>;
}

/// Templates held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template.
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    /// Add a template.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(id.into(), text.into());
    }
}

#[async_trait::async_trait]
impl TemplateSource for MemorySource {
    async fn load(&self, id: &str) -> io::Result<Option<String>> {
        Ok(self.templates.get(id).cloned())
    }
}

/// Templates stored as files under a directory.
///
/// The id `partials/header` resolves to `<root>/partials/header.<extension>`.
/// Ids that would escape the root directory never resolve.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    extension: String,
}

impl DirSource {
    /// Serve templates from `root` with the `html` extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource {
            root: root.into(),
            extension: "html".to_owned(),
        }
    }

    /// Change the file extension appended to template ids.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn path(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if id.is_empty() || !contained {
            return None;
        }

        let mut path = self.root.join(relative);
        if !self.extension.is_empty() {
            let file = format!("{}.{}", id.rsplit('/').next().unwrap_or(id), self.extension);
            path.set_file_name(file);
        }

        Some(path)
    }
}

#[async_trait::async_trait]
impl TemplateSource for DirSource {
    async fn load(&self, id: &str) -> io::Result<Option<String>> {
        let path = match self.path(id) {
            Some(path) => path,
            None => {
                tracing::debug!(id, "rejected template id outside of the views directory");
                return Ok(None);
            }
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}
