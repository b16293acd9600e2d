//! Framework-neutral HTTP request/response types.

/// An inbound HTTP request as seen by the capture middleware.
///
/// `HttpRequest` holds simple owned data so it does not couple to any
/// framework's request type. The body is kept as bytes: capturing it never
/// consumes it, so the wrapped handler reads the same body.
///
/// # Examples
///
/// ```
/// use audit_trail::web::HttpRequest;
///
/// let mut request = HttpRequest::new("POST", "/users/42");
/// request.set_route_pattern("/users/{id}");
/// request.add_header("Content-Type", "application/json");
/// request.set_body(br#"{"name":"Alice"}"#.to_vec());
///
/// assert_eq!(request.target(), "POST /users/{id}");
/// assert_eq!(request.body(), br#"{"name":"Alice"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    path: String,
    route_pattern: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the resolved route pattern (e.g. `/users/{id}`).
    ///
    /// Routers that resolve patterns should call this; without it the raw
    /// path is used as the target.
    pub fn set_route_pattern(&mut self, pattern: impl Into<String>) {
        self.route_pattern = Some(pattern.into());
    }

    /// Adds a header. Repeated names keep every value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Returns the request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the raw request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the resolved route pattern, if known.
    pub fn route_pattern(&self) -> Option<&str> {
        self.route_pattern.as_deref()
    }

    /// Returns all headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns every value of header `name` (case-insensitive).
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body. Reading it does not consume it.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns `"{METHOD} {route pattern or path}"`.
    pub fn target(&self) -> String {
        format!(
            "{} {}",
            self.method,
            self.route_pattern.as_deref().unwrap_or(&self.path)
        )
    }
}

/// The response produced by a wrapped handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with `status` and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns all headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
