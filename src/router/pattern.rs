use crate::http::Params;

use std::fmt;

use percent_encoding::percent_decode_str;

/// A compiled URL pattern such as `/speakers/:name?`.
///
/// Segments starting with `:` capture a named parameter. The last named
/// segment may be marked optional with a trailing `?`, in which case the
/// pattern matches with or without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param { name: String, optional: bool },
}

/// An error compiling a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route pattern `{0}` must start with `/`")]
    MissingSlash(String),
    #[error("route pattern `{0}` has a parameter with no name")]
    EmptyParam(String),
    #[error("route pattern `{pattern}` has an invalid parameter name `{name}`")]
    InvalidParam { pattern: String, name: String },
    #[error("route pattern `{pattern}` declares parameter `{name}` more than once")]
    DuplicateParam { pattern: String, name: String },
    #[error("route pattern `{0}` declares more than one optional segment")]
    MultipleOptional(String),
    #[error("optional parameter `{name}` must be the last segment of `{pattern}`")]
    OptionalNotTrailing { pattern: String, name: String },
}

impl Pattern {
    /// Compile a pattern.
    pub fn parse(raw: &str) -> Result<Pattern, RouteError> {
        if !raw.starts_with('/') {
            return Err(RouteError::MissingSlash(raw.to_owned()));
        }

        let mut segments = Vec::new();
        for part in split(raw) {
            let param = match part.strip_prefix(':') {
                Some(param) => param,
                None => {
                    segments.push(Segment::Static(part.to_owned()));
                    continue;
                }
            };

            let (name, optional) = match param.strip_suffix('?') {
                Some(name) => (name, true),
                None => (param, false),
            };

            if name.is_empty() {
                return Err(RouteError::EmptyParam(raw.to_owned()));
            }

            if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(RouteError::InvalidParam {
                    pattern: raw.to_owned(),
                    name: name.to_owned(),
                });
            }

            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name));

            if duplicate {
                return Err(RouteError::DuplicateParam {
                    pattern: raw.to_owned(),
                    name: name.to_owned(),
                });
            }

            segments.push(Segment::Param {
                name: name.to_owned(),
                optional,
            });
        }

        let optional = segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Segment::Param {
                    name,
                    optional: true,
                } => Some((i, name)),
                _ => None,
            })
            .collect::<Vec<_>>();

        match optional.as_slice() {
            [] => {}
            [(i, _)] if *i + 1 == segments.len() => {}
            [(_, name)] => {
                return Err(RouteError::OptionalNotTrailing {
                    pattern: raw.to_owned(),
                    name: name.to_string(),
                })
            }
            _ => return Err(RouteError::MultipleOptional(raw.to_owned())),
        }

        Ok(Pattern {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning the captured parameters.
    ///
    /// A single trailing slash on the path is ignored.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts = split(path).collect::<Vec<_>>();

        let optional_tail = matches!(
            self.segments.last(),
            Some(Segment::Param { optional: true, .. })
        );

        let arity_ok = parts.len() == self.segments.len()
            || (optional_tail && parts.len() + 1 == self.segments.len());

        if !arity_ok {
            return None;
        }

        let mut params = Params::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(expected) if expected == part => {}
                Segment::Static(_) => return None,
                Segment::Param { .. } if part.is_empty() => return None,
                Segment::Param { name, .. } => {
                    let value = percent_decode_str(part).decode_utf8_lossy();
                    params.push(name.as_str(), value);
                }
            }
        }

        Some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a path into segments, ignoring the leading and a single trailing slash.
fn split(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    let empty = path.is_empty();
    path.split('/').filter(move |_| !empty)
}
