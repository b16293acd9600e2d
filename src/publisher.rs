use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::PublishError;

/// A keyed message submitted to a topic.
///
/// The key is the transaction's event id; the payload is the serialized
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message key (the event id)
    pub key: String,
    /// Encoded payload
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    /// Creates a new message.
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

/// Publish-by-topic transport used to emit completed transactions.
///
/// Implementations wrap whatever pub/sub client the service uses. The call is
/// synchronous from the caller's point of view; delivery guarantees beyond
/// "accepted or rejected" are the transport's business.
///
/// # Examples
///
/// ```
/// use audit_trail::{InMemoryPublisher, OutboundMessage, Publisher};
///
/// let publisher = InMemoryPublisher::new();
/// publisher
///     .publish("audit.events", OutboundMessage::new("evt-1", b"{}".to_vec()))
///     .expect("in-memory publish succeeds");
///
/// assert_eq!(publisher.messages("audit.events").len(), 1);
/// ```
pub trait Publisher: Send + Sync {
    /// Submits `message` to `topic`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if the transport rejects the message.
    fn publish(&self, topic: &str, message: OutboundMessage) -> Result<(), PublishError>;
}

/// Publisher that keeps every message in memory, grouped by topic.
///
/// Useful for tests and local development. It can be switched into a failing
/// mode to exercise the publish-failure path.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    topics: Mutex<HashMap<String, Vec<OutboundMessage>>>,
    failure: Mutex<Option<PublishError>>,
}

impl InMemoryPublisher {
    /// Creates an empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that rejects every message with `error`.
    pub fn failing(error: PublishError) -> Self {
        let publisher = Self::new();
        publisher.fail_with(Some(error));
        publisher
    }

    /// Sets (or clears, with `None`) the error returned by subsequent publishes.
    pub fn fail_with(&self, error: Option<PublishError>) {
        *self.failure.lock() = error;
    }

    /// Returns a snapshot of the messages published to `topic`, in order.
    pub fn messages(&self, topic: &str) -> Vec<OutboundMessage> {
        self.topics.lock().get(topic).cloned().unwrap_or_default()
    }

    /// Provides borrowed access to the messages of `topic` via callback.
    pub fn with_messages<F, R>(&self, topic: &str, f: F) -> R
    where
        F: FnOnce(&[OutboundMessage]) -> R,
    {
        let topics = self.topics.lock();
        f(topics.get(topic).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Returns the total number of messages across all topics.
    pub fn len(&self) -> usize {
        self.topics.lock().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every recorded message.
    pub fn clear(&self) {
        self.topics.lock().clear();
    }
}

impl Publisher for InMemoryPublisher {
    fn publish(&self, topic: &str, message: OutboundMessage) -> Result<(), PublishError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_publisher_groups_by_topic() {
        let publisher = InMemoryPublisher::new();

        publisher
            .publish("a", OutboundMessage::new("1", b"one".to_vec()))
            .unwrap();
        publisher
            .publish("b", OutboundMessage::new("2", b"two".to_vec()))
            .unwrap();
        publisher
            .publish("a", OutboundMessage::new("3", b"three".to_vec()))
            .unwrap();

        assert_eq!(publisher.len(), 3);
        let keys: Vec<String> = publisher.messages("a").into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(publisher.messages("b")[0].payload, b"two");
    }

    #[test]
    fn unknown_topic_is_empty() {
        let publisher = InMemoryPublisher::new();
        assert!(publisher.messages("nothing").is_empty());
        assert_eq!(publisher.with_messages("nothing", |m| m.len()), 0);
        assert!(publisher.is_empty());
    }

    #[test]
    fn failing_publisher_rejects_without_side_effects() {
        let publisher = InMemoryPublisher::failing(PublishError::rejected("t", "down"));

        let result = publisher.publish("t", OutboundMessage::new("k", Vec::new()));

        assert_eq!(result, Err(PublishError::rejected("t", "down")));
        assert!(publisher.is_empty());
    }

    #[test]
    fn failure_mode_can_be_cleared() {
        let publisher = InMemoryPublisher::failing(PublishError::Closed);
        publisher.fail_with(None);

        publisher
            .publish("t", OutboundMessage::new("k", Vec::new()))
            .expect("should succeed once failure is cleared");

        assert_eq!(publisher.len(), 1);
        publisher.clear();
        assert!(publisher.is_empty());
    }
}
