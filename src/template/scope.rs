use serde::Serialize;
use serde_json::{Map, Value};

/// A set of template variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Locals(Map<String, Value>);

impl Locals {
    /// Create an empty set of variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build variables from any type that serializes to a map, such as a
    /// struct or a `serde_json::json!` object.
    pub fn from_serialize<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Locals(map)),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "template variables must serialize to a map, found {}",
                kind(&other)
            ))),
        }
    }

    /// Insert a variable, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Insert a variable, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a variable by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Remove a variable.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns `true` if there are no variables.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of variables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the variables.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Locals {
    fn from(map: Map<String, Value>) -> Self {
        Locals(map)
    }
}

impl<K, V> FromIterator<(K, V)> for Locals
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Locals(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V> Extend<(K, V)> for Locals
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Locals {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Build [`Locals`] from `name => value` pairs.
///
/// ```
/// let locals = gantry::locals! {
///     "pageTitle" => "Welcome",
///     "attendees" => 42,
/// };
/// assert_eq!(locals.len(), 2);
/// ```
#[macro_export]
macro_rules! locals {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut locals = $crate::template::Locals::new();
        $(locals.insert($name, $value);)*
        locals
    }};
}

/// The three layers of variables visible to a render call.
///
/// Names resolve against the call-local layer first, then the
/// request-global layer, then the process-wide layer. The first
/// layer that defines a name wins.
#[derive(Debug, Clone, Copy)]
pub struct ScopeSet<'a> {
    /// Variables passed to this render call.
    pub call: &'a Locals,
    /// Variables set by middleware for the current request.
    pub request: &'a Locals,
    /// Variables configured once for the whole process.
    pub process: &'a Locals,
}

impl<'a> ScopeSet<'a> {
    /// Resolve a top-level variable name.
    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.call
            .get(name)
            .or_else(|| self.request.get(name))
            .or_else(|| self.process.get(name))
    }

    /// Merge the three layers into one, keeping the value that
    /// [`lookup`](ScopeSet::lookup) would resolve for each name.
    pub fn flatten(&self) -> Locals {
        let mut merged = self.process.clone();
        merged.extend(self.request.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.extend(self.call.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
