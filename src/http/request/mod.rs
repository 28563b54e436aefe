mod param;

pub use param::Params;

use super::Body;

use http::{HeaderMap, Method, Uri};
use once_cell::sync::OnceCell;

/// An inbound HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
    pub(crate) params: Params,
    query: OnceCell<Params>,
}

impl Request {
    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The request body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Route parameters captured by the matched route.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A single route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// A query string parameter.
    ///
    /// The query string is parsed on first access. A malformed
    /// query string behaves as if it were empty.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params().get(name)
    }

    /// All query string parameters.
    pub fn query_params(&self) -> &Params {
        self.query.get_or_init(|| match self.uri.query() {
            Some(query) => serde_urlencoded::from_str::<Vec<(String, String)>>(query)
                .map(Params::from)
                .unwrap_or_default(),
            None => Params::default(),
        })
    }
}

impl From<http::Request<Body>> for Request {
    fn from(req: http::Request<Body>) -> Self {
        let (parts, body) = req.into_parts();

        Request {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: Params::default(),
            query: OnceCell::new(),
        }
    }
}
