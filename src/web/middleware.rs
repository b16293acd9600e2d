//! HTTP capture middleware.
//!
//! Wraps a request handler so that every request gets its own
//! [`Transaction`], reachable from the handler through the [`Ctx`] it is
//! called with.
//!
//! # Flow
//!
//! ```text
//! HttpRequest
//!   ↓
//! build Transaction (service, actor defaults, target, headers, body)
//!   ↓
//! start() → attach to Ctx → next(ctx, request)
//!   ↓
//! record response body / status code
//!   ↓
//! end() → publish if any activity was recorded (or forced by config)
//! ```

use crate::capture::{decode_json_object, new_transaction};
use crate::channel::Channel;
use crate::config::CaptureConfig;
use crate::context::Ctx;
use crate::record::{Origin, Transaction, TransactionBuilder};

use super::{capture_headers, HttpRequest, HttpResponse, IntoHttpRequest};

/// Capture middleware for HTTP handlers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use audit_trail::web::{HttpCapture, HttpRequest, HttpResponse};
/// use audit_trail::{CaptureConfig, Channel, Ctx, InMemoryPublisher, SegmentBuilder, TransactionBuilder};
///
/// let publisher = Arc::new(InMemoryPublisher::new());
/// let capture = HttpCapture::new(
///     Channel::new(publisher.clone()),
///     CaptureConfig::new("users", "audit.activity").with_record_response_code(true),
/// );
///
/// let response = capture.handle(&Ctx::new(), HttpRequest::new("POST", "/users"), |ctx, _request| {
///     if let Some(tx) = ctx.transaction() {
///         tx.lock().begin_action("create", "create user").mark_succeeded().complete();
///     }
///     HttpResponse::new(201)
/// });
///
/// assert_eq!(response.status(), 201);
/// assert_eq!(publisher.messages("audit.activity").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HttpCapture {
    channel: Channel,
    config: CaptureConfig,
}

impl HttpCapture {
    /// Creates a capture middleware publishing through `channel`.
    pub fn new(channel: Channel, config: CaptureConfig) -> Self {
        Self { channel, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Runs `next` inside a captured transaction and returns its response.
    ///
    /// The handler receives a context derived from `ctx` with the new
    /// transaction attached. Publishing happens after `next` returns and
    /// before this call does; publish failures never change the response.
    pub fn handle<R, F>(&self, ctx: &Ctx, request: R, next: F) -> HttpResponse
    where
        R: IntoHttpRequest,
        F: FnOnce(&Ctx, HttpRequest) -> HttpResponse,
    {
        let request = request.into_http_request();

        let mut tx = self.begin(&request);
        tx.start();

        let shared = tx.into_shared();
        let ctx = ctx.with_transaction(shared.clone());

        let response = next(&ctx, request);
        let log = ctx.log();

        // The lock is released before the publisher and failure hook run
        let pending = {
            let mut tx = shared.lock();
            self.record_response(&mut tx, &response);
            tx.end();

            if !tx.activities.is_empty() || self.config.publish_when_no_activities {
                tx.prepare_publish(&self.config.topic_name, &log).ok()
            } else {
                log.debug(format_args!(
                    "no activities recorded for {}, skipping publish",
                    tx.target
                ));
                None
            }
        };
        if let Some(pending) = pending {
            pending.send(&log);
        }

        response
    }

    fn begin(&self, request: &HttpRequest) -> Transaction {
        let mut tx = new_transaction(&self.config, Origin::Http, &self.channel);
        tx.set_target(request.target());

        if self.config.record_request_body {
            tx.set_request_body(decode_json_object(request.body()));
        }
        if self.config.record_header {
            tx.set_header(capture_headers(request));
        }
        tx
    }

    fn record_response(&self, tx: &mut Transaction, response: &HttpResponse) {
        if self.config.record_response_body {
            tx.set_response_body(decode_json_object(response.body()));
        }
        if self.config.record_response_code {
            tx.set_response_code(response.status());
        }
    }
}
