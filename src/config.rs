//! Capture configuration.

use serde::Deserialize;

use crate::error::AuditError;

/// Static configuration shared by the capture middlewares.
///
/// Every `record_*` flag defaults to `false`, as does
/// `publish_when_no_activities`.
///
/// # Example
///
/// ```
/// use audit_trail::CaptureConfig;
///
/// let config = CaptureConfig::new("billing", "audit.activity")
///     .with_actor_type("user")
///     .with_record_request_body(true)
///     .with_record_response_code(true);
///
/// assert_eq!(config.topic_name, "audit.activity");
/// assert!(!config.publish_when_no_activities);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Service name stamped on every transaction
    pub service_name: String,
    /// Default actor type
    pub actor_type: String,
    /// Default actor email
    pub actor_email: String,
    /// Topic transactions are published to
    pub topic_name: String,
    /// Capture the request body (HTTP)
    pub record_request_body: bool,
    /// Capture the response body (HTTP)
    pub record_response_body: bool,
    /// Capture request headers (HTTP)
    pub record_header: bool,
    /// Capture the response status code (HTTP)
    pub record_response_code: bool,
    /// Publish HTTP transactions that recorded no activities
    pub publish_when_no_activities: bool,
}

impl CaptureConfig {
    /// Creates a configuration with every capture flag off.
    pub fn new(service_name: impl Into<String>, topic_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            topic_name: topic_name.into(),
            ..Self::default()
        }
    }

    /// Sets the default actor type.
    pub fn with_actor_type(mut self, actor_type: impl Into<String>) -> Self {
        self.actor_type = actor_type.into();
        self
    }

    /// Sets the default actor email.
    pub fn with_actor_email(mut self, actor_email: impl Into<String>) -> Self {
        self.actor_email = actor_email.into();
        self
    }

    /// Enables or disables request body capture.
    pub fn with_record_request_body(mut self, enabled: bool) -> Self {
        self.record_request_body = enabled;
        self
    }

    /// Enables or disables response body capture.
    pub fn with_record_response_body(mut self, enabled: bool) -> Self {
        self.record_response_body = enabled;
        self
    }

    /// Enables or disables header capture.
    pub fn with_record_header(mut self, enabled: bool) -> Self {
        self.record_header = enabled;
        self
    }

    /// Enables or disables response code capture.
    pub fn with_record_response_code(mut self, enabled: bool) -> Self {
        self.record_response_code = enabled;
        self
    }

    /// Publishes HTTP transactions even when no activity was recorded.
    pub fn with_publish_when_no_activities(mut self, enabled: bool) -> Self {
        self.publish_when_no_activities = enabled;
        self
    }

    /// Loads the configuration from `AUDIT_TRAIL_*` environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `AUDIT_TRAIL_SERVICE_NAME` | `service_name` (required) |
    /// | `AUDIT_TRAIL_TOPIC_NAME` | `topic_name` (required) |
    /// | `AUDIT_TRAIL_ACTOR_TYPE` | `actor_type` |
    /// | `AUDIT_TRAIL_ACTOR_EMAIL` | `actor_email` |
    /// | `AUDIT_TRAIL_RECORD_REQUEST_BODY` | `record_request_body` |
    /// | `AUDIT_TRAIL_RECORD_RESPONSE_BODY` | `record_response_body` |
    /// | `AUDIT_TRAIL_RECORD_HEADER` | `record_header` |
    /// | `AUDIT_TRAIL_RECORD_RESPONSE_CODE` | `record_response_code` |
    /// | `AUDIT_TRAIL_PUBLISH_WHEN_NO_ACTIVITIES` | `publish_when_no_activities` |
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Config` if a required variable is missing or a
    /// flag is not a boolean.
    pub fn from_env() -> Result<Self, AuditError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, using the same keys as
    /// [`from_env`](Self::from_env).
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Config` if a required key is missing or a flag is
    /// not a boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuditError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AuditError::config(key, "required but not set"))
        };
        let flag = |key: &str| match lookup(key) {
            None => Ok(false),
            Some(raw) => parse_flag(key, &raw),
        };

        Ok(Self {
            service_name: required("AUDIT_TRAIL_SERVICE_NAME")?,
            topic_name: required("AUDIT_TRAIL_TOPIC_NAME")?,
            actor_type: lookup("AUDIT_TRAIL_ACTOR_TYPE").unwrap_or_default(),
            actor_email: lookup("AUDIT_TRAIL_ACTOR_EMAIL").unwrap_or_default(),
            record_request_body: flag("AUDIT_TRAIL_RECORD_REQUEST_BODY")?,
            record_response_body: flag("AUDIT_TRAIL_RECORD_RESPONSE_BODY")?,
            record_header: flag("AUDIT_TRAIL_RECORD_HEADER")?,
            record_response_code: flag("AUDIT_TRAIL_RECORD_RESPONSE_CODE")?,
            publish_when_no_activities: flag("AUDIT_TRAIL_PUBLISH_WHEN_NO_ACTIVITIES")?,
        })
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AuditError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(AuditError::config(
            key,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}
