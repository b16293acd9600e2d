//! Transaction record, builder protocol and publish lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Activity, Segment, SegmentBuilder};
use crate::channel::{Channel, PublishFailure, PublishStatus};
use crate::error::AuditError;
use crate::logging::TraceLog;
use crate::publisher::OutboundMessage;

/// Where a transaction was captured. Not serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// Built directly by calling code
    #[default]
    Direct,
    /// Built by the HTTP capture middleware
    Http,
    /// Built by the message-consumer capture middleware
    Message,
}

/// A transaction shared between a capture middleware and the handler it wraps.
pub type SharedTransaction = Arc<Mutex<Transaction>>;

/// Record of one inbound request or message and every activity performed
/// while handling it.
///
/// # Invariants
///
/// - `event_id` stays empty until [`publish`](TransactionBuilder::publish)
///   assigns it, exactly once
/// - `activities` only grows, in completion order, through
///   [`Segment::complete`](SegmentBuilder::complete)
/// - `time_end >= time_start` once both are stamped by `start`/`end`
///
/// # Example
///
/// ```
/// use audit_trail::{SegmentBuilder, Transaction, TransactionBuilder};
///
/// let mut tx = Transaction::new("svc");
/// tx.start();
///
/// tx.begin_action("create", "create user")
///     .set_target_user_id("u1")
///     .set_target_business_id(123)
///     .mark_succeeded()
///     .complete();
///
/// tx.end();
///
/// assert_eq!(tx.activities.len(), 1);
/// assert_eq!(tx.target_user_id, "u1");
/// assert_eq!(tx.target_business_id, "123");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Unique id assigned at publish time
    #[serde(rename = "eventID")]
    pub event_id: String,
    /// Free-form classification of the event
    pub event_type: String,
    /// Service that captured the transaction
    pub service: String,
    /// Identity (subject id) of the actor
    pub actor: String,
    /// Email of the actor
    pub actor_email: String,
    /// Kind of actor (user, admin, system, ...)
    pub actor_type: String,
    /// User affected by the transaction
    pub target_user_id: String,
    /// Business affected by the transaction, as a decimal string
    pub target_business_id: String,
    /// Endpoint description, e.g. `"POST /users"`
    pub target: String,
    /// Captured request headers
    pub header: Option<Map<String, Value>>,
    /// Captured request body
    pub request_body: Option<Map<String, Value>>,
    /// Captured response body
    pub response_body: Option<Map<String, Value>>,
    /// Captured response status code
    pub response_code: u16,
    /// Activities in completion order
    pub activities: Vec<Activity>,
    /// When processing started
    pub time_start: Option<DateTime<Utc>>,
    /// When processing finished
    pub time_end: Option<DateTime<Utc>>,
    /// Resource tag
    pub resource: String,
    /// Type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Which capture path built this transaction
    #[serde(skip)]
    pub origin: Origin,
    /// Channel used by `publish`
    #[serde(skip)]
    pub channel: Option<Channel>,
}

/// Chainable mutation protocol of a transaction.
///
/// [`Transaction`] is the production implementation; the trait exists so
/// handler code can be exercised against test doubles.
pub trait TransactionBuilder {
    /// Segment type handed out by [`begin_action`](Self::begin_action).
    type Segment<'a>: SegmentBuilder
    where
        Self: 'a;

    /// Stamps the start time. Calling it again overwrites the previous value.
    fn start(&mut self) -> &mut Self;

    /// Stamps the end time, never earlier than the start time. Last call wins.
    fn end(&mut self) -> &mut Self;

    /// Sets the event type.
    fn set_event_type(&mut self, event_type: impl Into<String>) -> &mut Self;

    /// Sets the actor identity.
    fn set_actor(&mut self, actor: impl Into<String>) -> &mut Self;

    /// Sets the actor email.
    fn set_actor_email(&mut self, actor_email: impl Into<String>) -> &mut Self;

    /// Sets the actor type.
    fn set_actor_type(&mut self, actor_type: impl Into<String>) -> &mut Self;

    /// Replaces the captured header map.
    fn set_header(&mut self, header: Map<String, Value>) -> &mut Self;

    /// Sets the type tag.
    fn set_type(&mut self, kind: impl Into<String>) -> &mut Self;

    /// Sets the resource tag.
    fn set_resource(&mut self, resource: impl Into<String>) -> &mut Self;

    /// Encodes the full transaction, including activities, as JSON.
    fn to_payload(&self) -> Vec<u8>;

    /// Opens a segment recording a new activity, initially failed.
    fn begin_action(&mut self, action: &str, message: &str) -> Self::Segment<'_>;

    /// Assigns an event id and submits the transaction to `topic_name`.
    ///
    /// Failures are logged and reported to the channel's failure hook, never
    /// returned as errors.
    fn publish(&mut self, topic_name: &str) -> PublishStatus;
}

impl Transaction {
    /// Creates an empty transaction for `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Wraps the transaction for sharing through a request context.
    pub fn into_shared(self) -> SharedTransaction {
        Arc::new(Mutex::new(self))
    }

    /// Sets the service name.
    pub fn set_service(&mut self, service: impl Into<String>) -> &mut Self {
        self.service = service.into();
        self
    }

    /// Sets the target description (e.g. `"POST /users"`).
    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = target.into();
        self
    }

    /// Sets the captured request body.
    pub fn set_request_body(&mut self, body: Option<Map<String, Value>>) -> &mut Self {
        self.request_body = body;
        self
    }

    /// Sets the captured response body.
    pub fn set_response_body(&mut self, body: Option<Map<String, Value>>) -> &mut Self {
        self.response_body = body;
        self
    }

    /// Sets the captured response status code.
    pub fn set_response_code(&mut self, code: u16) -> &mut Self {
        self.response_code = code;
        self
    }

    /// Binds the channel used by `publish`.
    pub fn set_channel(&mut self, channel: Channel) -> &mut Self {
        self.channel = Some(channel);
        self
    }

    /// Sets the capture origin.
    pub fn set_origin(&mut self, origin: Origin) -> &mut Self {
        self.origin = origin;
        self
    }

    /// Returns true once an event id has been assigned.
    pub fn is_published(&self) -> bool {
        !self.event_id.is_empty()
    }

    /// Encodes the transaction as JSON, surfacing encoder errors.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Serialization` if encoding fails.
    pub fn try_to_payload(&self) -> Result<Vec<u8>, AuditError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Publishes with log events tagged by `log`'s trace id.
    pub(crate) fn publish_traced(&mut self, topic_name: &str, log: &TraceLog<'_>) -> PublishStatus {
        match self.prepare_publish(topic_name, log) {
            Ok(pending) => pending.send(log),
            Err(status) => status,
        }
    }

    /// Assigns the event id and encodes the payload without calling out.
    ///
    /// Callers holding a [`SharedTransaction`] lock run this under the lock
    /// and [`PendingPublish::send`] after releasing it, so a publisher or
    /// failure hook that touches the same transaction cannot deadlock.
    pub(crate) fn prepare_publish(
        &mut self,
        topic_name: &str,
        log: &TraceLog<'_>,
    ) -> Result<PendingPublish, PublishStatus> {
        if self.is_published() {
            log.warn(format_args!(
                "activity log {} already published, skipping",
                self.event_id
            ));
            return Err(PublishStatus::AlreadyPublished);
        }
        let Some(channel) = self.channel.clone() else {
            log.warn(format_args!(
                "no publishing channel bound, dropping activity log for topic {}",
                topic_name
            ));
            return Err(PublishStatus::NoChannel);
        };

        self.event_id = channel.next_event_id();
        Ok(PendingPublish {
            channel,
            topic: topic_name.to_string(),
            event_id: self.event_id.clone(),
            payload: self.to_payload(),
        })
    }
}

/// An encoded transaction ready to hand to its channel.
#[derive(Debug)]
pub(crate) struct PendingPublish {
    channel: Channel,
    topic: String,
    event_id: String,
    payload: Vec<u8>,
}

impl PendingPublish {
    /// Submits the payload; failures are logged and reported to the hook.
    pub(crate) fn send(self, log: &TraceLog<'_>) -> PublishStatus {
        log.publishing(&self.event_id, &self.topic, &self.payload);

        let message = OutboundMessage::new(self.event_id.clone(), self.payload);
        match self.channel.publisher().publish(&self.topic, message) {
            Ok(()) => PublishStatus::Published,
            Err(error) => {
                log.publish_failed(&self.event_id, &self.topic, &error);
                self.channel.report_failure(&PublishFailure {
                    event_id: self.event_id,
                    topic: self.topic,
                    error,
                });
                PublishStatus::Failed
            }
        }
    }
}

impl TransactionBuilder for Transaction {
    type Segment<'a> = Segment<'a>;

    fn start(&mut self) -> &mut Self {
        self.time_start = Some(Utc::now());
        self
    }

    fn end(&mut self) -> &mut Self {
        let now = Utc::now();
        // Wall-clock steps backwards must not invert the interval
        self.time_end = Some(match self.time_start {
            Some(start) if start > now => start,
            _ => now,
        });
        self
    }

    fn set_event_type(&mut self, event_type: impl Into<String>) -> &mut Self {
        self.event_type = event_type.into();
        self
    }

    fn set_actor(&mut self, actor: impl Into<String>) -> &mut Self {
        self.actor = actor.into();
        self
    }

    fn set_actor_email(&mut self, actor_email: impl Into<String>) -> &mut Self {
        self.actor_email = actor_email.into();
        self
    }

    fn set_actor_type(&mut self, actor_type: impl Into<String>) -> &mut Self {
        self.actor_type = actor_type.into();
        self
    }

    fn set_header(&mut self, header: Map<String, Value>) -> &mut Self {
        self.header = Some(header);
        self
    }

    fn set_type(&mut self, kind: impl Into<String>) -> &mut Self {
        self.kind = kind.into();
        self
    }

    fn set_resource(&mut self, resource: impl Into<String>) -> &mut Self {
        self.resource = resource.into();
        self
    }

    fn to_payload(&self) -> Vec<u8> {
        match self.try_to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(target: "audit_trail", error = %err, "failed to encode activity log");
                Vec::new()
            }
        }
    }

    fn begin_action(&mut self, action: &str, message: &str) -> Segment<'_> {
        Segment::new(self, Activity::new(action, message))
    }

    fn publish(&mut self, topic_name: &str) -> PublishStatus {
        self.publish_traced(topic_name, &TraceLog::new(None))
    }
}
