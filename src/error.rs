/// Errors returned by a [`Publisher`](crate::Publisher) when a message cannot
/// be handed to the transport.
///
/// These never escape [`Transaction::publish`](crate::Transaction::publish);
/// they are logged and passed to the channel's failure hook instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The transport refused the message.
    #[error("publish to topic '{topic}' rejected: {reason}")]
    Rejected {
        /// Topic the message was addressed to
        topic: String,
        /// Transport-supplied reason
        reason: String,
    },
    /// The publisher has been shut down.
    #[error("publisher is closed")]
    Closed,
}

impl PublishError {
    /// Creates a rejection error for `topic`.
    pub fn rejected(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur in the audit-trail crate.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The publishing channel failed.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    /// A record could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value was missing or malformed.
    #[error("invalid configuration for {key}: {message}")]
    Config {
        /// Environment variable or field name
        key: String,
        /// What was wrong with it
        message: String,
    },
}

impl AuditError {
    /// Creates a configuration error.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}
