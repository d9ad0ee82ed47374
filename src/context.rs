//! The per-request state threaded through a handler chain.
use hyper::header::HeaderMap;
use hyper::{Body, Request, Response, StatusCode};

/// Path parameters captured by a route's pattern.
///
/// Values are the raw captured substrings, kept in the order the parameters
/// appear in the template.
/// ```rust
/// # use chainrouter::pattern::Pattern;
/// let pattern = Pattern::compile("/blog/:category/:post").unwrap();
/// let params = pattern.extract("/blog/rust/request-routers");
///
/// assert_eq!(params.get("category"), Some("rust"));
/// assert_eq!(params.get("post"), Some("request-routers"));
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub(crate) fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns the value captured for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The mutable request context passed to every [`Handler`](crate::Handler).
///
/// It owns the inbound request, the parameters extracted by the matched route,
/// and the response being built up by the chain. Response status defaults to
/// `404 Not Found` until a body or an explicit status is set.
#[derive(Debug)]
pub struct Context {
    request: Request<Body>,
    params: Params,
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Context {
    pub fn new(request: Request<Body>) -> Self {
        Self {
            request,
            params: Params::default(),
            status: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    pub fn method(&self) -> &hyper::Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Parameters extracted by the route that matched this request.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shorthand for `ctx.params().get(key)`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn status(&self) -> StatusCode {
        match (self.status, &self.body) {
            (Some(status), _) => status,
            (None, Some(_)) => StatusCode::OK,
            (None, None) => StatusCode::NOT_FOUND,
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The response body, if one is set and it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        self.body().and_then(|body| std::str::from_utf8(body).ok())
    }

    /// Replaces the response body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = Some(body.into());
    }

    /// Appends to the response body, starting one if none is set.
    pub fn append_body(&mut self, chunk: impl AsRef<[u8]>) {
        self.body
            .get_or_insert_with(Vec::new)
            .extend_from_slice(chunk.as_ref());
    }

    /// Converts the context into the response it describes.
    pub fn into_response(self) -> Response<Body> {
        let status = self.status();
        let mut res = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *res.status_mut() = status;
        *res.headers_mut() = self.headers;
        res
    }
}
