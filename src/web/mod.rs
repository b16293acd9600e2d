//! Web framework integration surface.
//!
//! This module bridges HTTP request processing to the recording model. It
//! handles:
//! - Mapping framework requests to a neutral [`HttpRequest`]
//! - Capturing target, headers and bodies into a `Transaction`
//! - Publishing the finished transaction once the handler returns
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: framework-specific code converts its
//!    request type with [`IntoHttpRequest`] and calls [`HttpCapture::handle`].
//!
//! 2. **Body Stays Readable**: the body is buffered in the request, so
//!    capturing it does not take it away from the handler.
//!
//! 3. **Explicit Context**: the handler receives the transaction through
//!    the `Ctx` argument, never through global state.
//!
//! # Example Flow
//!
//! ```ignore
//! // In a framework-specific integration (e.g., axum, actix):
//! let request = framework_request.into_http_request();
//! let response = capture.handle(&ctx, request, |ctx, request| {
//!     let tx = ctx.transaction();
//!     // ... handler code records activities on tx ...
//!     HttpResponse::new(200)
//! });
//! ```

mod adapter;
mod extract;
mod middleware;

pub use adapter::{HttpRequest, HttpResponse};
pub use extract::{capture_headers, IntoHttpRequest};
pub use middleware::HttpCapture;
