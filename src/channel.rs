//! Publishing channel bound to a transaction.
//!
//! A [`Channel`] bundles the transport ([`Publisher`]), the event id source
//! and an optional failure hook. Publish failures never propagate to the
//! request pipeline; the hook is how callers observe them.

use std::fmt;
use std::sync::Arc;

use crate::error::PublishError;
use crate::publisher::Publisher;

/// Produces globally unique event identifiers.
pub trait EventIdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn next_id(&self) -> String;
}

/// Random (v4) UUID event ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl EventIdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Details of a publish attempt the transport rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
    /// Event id assigned to the transaction before the attempt
    pub event_id: String,
    /// Topic the transaction was addressed to
    pub topic: String,
    /// Error returned by the publisher
    pub error: PublishError,
}

/// Callback invoked when a publish attempt fails.
pub type FailureHook = Arc<dyn Fn(&PublishFailure) + Send + Sync>;

/// What a publish call did.
///
/// Purely observational: none of these are errors from the caller's
/// perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// The transport accepted the message
    Published,
    /// The transport rejected the message (logged and reported to the hook)
    Failed,
    /// The transaction already carried an event id and was not sent again
    AlreadyPublished,
    /// No channel was bound to the transaction
    NoChannel,
}

/// Transport handle carried by a [`Transaction`](crate::Transaction).
///
/// Cloning is cheap; all parts are reference counted.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use audit_trail::{Channel, InMemoryPublisher};
///
/// let publisher = Arc::new(InMemoryPublisher::new());
/// let channel = Channel::new(publisher.clone())
///     .on_failure(|failure| eprintln!("audit publish failed: {}", failure.error));
/// # let _ = channel;
/// ```
#[derive(Clone)]
pub struct Channel {
    publisher: Arc<dyn Publisher>,
    ids: Arc<dyn EventIdGenerator>,
    on_failure: Option<FailureHook>,
}

impl Channel {
    /// Creates a channel over `publisher` using UUID v4 event ids.
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher,
            ids: Arc::new(UuidGenerator),
            on_failure: None,
        }
    }

    /// Replaces the event id generator.
    pub fn with_id_generator(mut self, ids: Arc<dyn EventIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Installs a hook called with every failed publish attempt.
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PublishFailure) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    /// Returns the underlying publisher.
    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    pub(crate) fn next_event_id(&self) -> String {
        self.ids.next_id()
    }

    pub(crate) fn report_failure(&self, failure: &PublishFailure) {
        if let Some(hook) = &self.on_failure {
            hook(failure);
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("on_failure", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

/// Two channels are equal when they share the same publisher instance.
impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.publisher, &other.publisher)
    }
}
