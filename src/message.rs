//! Message-consumer capture middleware.
//!
//! Every consumed message is recorded as one transaction whose request body
//! is the message payload. Unlike HTTP capture, the transaction is published
//! unconditionally once the handler returns, even when the handler failed;
//! the handler's result is handed back to the consumer pipeline afterwards.

use std::collections::HashMap;

use crate::capture::{decode_json_object, new_transaction};
use crate::channel::Channel;
use crate::config::CaptureConfig;
use crate::context::Ctx;
use crate::logging::TraceLog;
use crate::record::{Origin, SharedTransaction, TransactionBuilder};

/// An inbound message handed to a consumer.
///
/// # Examples
///
/// ```
/// use audit_trail::InboundMessage;
///
/// let message = InboundMessage::new("msg-1", br#"{"orderId":7}"#.to_vec())
///     .with_metadata("source", "orders");
///
/// assert_eq!(message.metadata("source"), Some("orders"));
/// assert!(message.context().transaction().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    uuid: String,
    payload: Vec<u8>,
    metadata: HashMap<String, String>,
    ctx: Ctx,
}

impl InboundMessage {
    /// Creates a message with an empty context.
    pub fn new(uuid: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            uuid: uuid.into(),
            payload,
            ..Self::default()
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the message id.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Returns the raw payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns a metadata value.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Returns the context carried with the message.
    pub fn context(&self) -> &Ctx {
        &self.ctx
    }

    /// Replaces the context carried with the message.
    pub fn set_context(&mut self, ctx: Ctx) {
        self.ctx = ctx;
    }
}

/// Capture middleware for message consumers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use audit_trail::{CaptureConfig, Channel, InMemoryPublisher, InboundMessage, MessageCapture};
///
/// let publisher = Arc::new(InMemoryPublisher::new());
/// let capture = MessageCapture::new(
///     Channel::new(publisher.clone()),
///     CaptureConfig::new("orders-worker", "audit.activity"),
/// );
///
/// let result: Result<(), String> = capture.handle(
///     InboundMessage::new("msg-1", br#"{"orderId":7}"#.to_vec()),
///     |_message| Err("downstream unavailable".to_string()),
/// );
///
/// // The handler failed, but the transaction was still published
/// assert!(result.is_err());
/// assert_eq!(publisher.messages("audit.activity").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MessageCapture {
    channel: Channel,
    config: CaptureConfig,
}

impl MessageCapture {
    /// Creates a capture middleware publishing through `channel`.
    pub fn new(channel: Channel, config: CaptureConfig) -> Self {
        Self { channel, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Runs `next` inside a captured transaction and returns its result.
    ///
    /// The message's context is replaced by one carrying the transaction
    /// before `next` sees it. The transaction is ended and published when
    /// `next` returns, and also when it panics.
    ///
    /// # Errors
    ///
    /// Returns whatever error `next` returned, after the transaction has
    /// been published.
    pub fn handle<T, E, F>(&self, mut message: InboundMessage, next: F) -> Result<T, E>
    where
        F: FnOnce(&InboundMessage) -> Result<T, E>,
    {
        let mut tx = new_transaction(&self.config, Origin::Message, &self.channel);
        tx.set_request_body(decode_json_object(message.payload()));
        tx.start();

        let shared = tx.into_shared();
        let ctx = message.context().with_transaction(shared.clone());
        message.set_context(ctx);

        let finish = PublishOnDrop {
            shared,
            topic: &self.config.topic_name,
            trace_id: message.context().trace_id().map(str::to_string),
        };

        let result = next(&message);
        if result.is_err() {
            message.context().log().debug(format_args!(
                "handler for message {} failed, publishing activity log anyway",
                message.uuid()
            ));
        }
        drop(finish);

        result
    }
}

/// Ends and publishes the message transaction when dropped, including
/// while unwinding out of a panicking handler.
struct PublishOnDrop<'a> {
    shared: SharedTransaction,
    topic: &'a str,
    trace_id: Option<String>,
}

impl Drop for PublishOnDrop<'_> {
    fn drop(&mut self) {
        let log = TraceLog::new(self.trace_id.as_deref());
        if std::thread::panicking() {
            log.warn(format_args!(
                "message handler panicked, publishing activity log before unwinding"
            ));
        }

        let pending = {
            let mut tx = self.shared.lock();
            tx.end();
            tx.prepare_publish(self.topic, &log).ok()
        };
        if let Some(pending) = pending {
            pending.send(&log);
        }
    }
}
