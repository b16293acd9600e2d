//! Extraction boundary between web frameworks and the capture middleware.

use serde_json::{Map, Value};

use super::HttpRequest;

/// Converts a framework-specific request into an [`HttpRequest`].
///
/// Framework integrations implement this to feed the capture middleware:
/// method, raw path, the router's resolved pattern when it has one, headers
/// and the fully buffered body.
///
/// # Examples
///
/// ```
/// use audit_trail::web::{HttpRequest, IntoHttpRequest};
///
/// struct MyFrameworkRequest {
///     verb: &'static str,
///     uri: String,
///     matched_route: Option<String>,
/// }
///
/// impl IntoHttpRequest for MyFrameworkRequest {
///     fn into_http_request(self) -> HttpRequest {
///         let mut request = HttpRequest::new(self.verb, self.uri);
///         if let Some(route) = self.matched_route {
///             request.set_route_pattern(route);
///         }
///         request
///     }
/// }
///
/// let request = MyFrameworkRequest {
///     verb: "DELETE",
///     uri: "/users/9".to_string(),
///     matched_route: Some("/users/{id}".to_string()),
/// }
/// .into_http_request();
///
/// assert_eq!(request.target(), "DELETE /users/{id}");
/// ```
pub trait IntoHttpRequest {
    /// Performs the conversion.
    fn into_http_request(self) -> HttpRequest;
}

impl IntoHttpRequest for HttpRequest {
    fn into_http_request(self) -> HttpRequest {
        self
    }
}

/// Collects request headers as `{name: [value, ...]}`.
///
/// Names are canonicalized (`content-type` becomes `Content-Type`), so
/// repeated headers accumulate their values in order regardless of casing.
pub fn capture_headers(request: &HttpRequest) -> Map<String, Value> {
    let mut header = Map::new();
    for (name, value) in request.headers() {
        let entry = header
            .entry(canonical_header_name(name))
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = entry {
            values.push(Value::String(value.clone()));
        }
    }
    header
}

/// Upper-cases the first letter and every letter after a hyphen, lower-cases
/// the rest. Names containing bytes outside the token set are kept as is.
fn canonical_header_name(name: &str) -> String {
    let is_token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if name.is_empty() || !name.chars().all(is_token) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}
