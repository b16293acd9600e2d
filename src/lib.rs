//! Audit-trail capture for HTTP handlers and message consumers.
//!
//! This crate records what a service did while handling one inbound request
//! or message and emits the record to a publish/subscribe topic:
//! - **Transactions**: one record per inbound request/message
//! - **Activities**: discrete business actions appended through segments
//! - **Explicit context**: handlers reach the active transaction through `Ctx`
//! - **Capture middlewares**: build, finalize and publish transactions
//!
//! # Core Types
//!
//! - [`Transaction`]: the record, with chainable setters ([`TransactionBuilder`])
//! - [`Segment`]: builder for one [`Activity`] ([`SegmentBuilder`])
//! - [`Ctx`]: request-scoped context carrying the active transaction
//! - [`Channel`]: publishing channel wrapping a [`Publisher`]
//! - [`web::HttpCapture`] / [`MessageCapture`]: capture middlewares
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use audit_trail::{
//!     Channel, Ctx, InMemoryPublisher, SegmentBuilder, Transaction, TransactionBuilder,
//! };
//!
//! let publisher = Arc::new(InMemoryPublisher::new());
//!
//! let mut tx = Transaction::new("users");
//! tx.set_channel(Channel::new(publisher.clone()));
//! tx.set_actor("kc-123").set_actor_type("admin").start();
//!
//! let ctx = Ctx::new().with_transaction(tx.into_shared());
//!
//! // Somewhere down the call chain
//! if let Some(tx) = ctx.transaction() {
//!     tx.lock()
//!         .begin_action("create", "create user")
//!         .set_target_user_id("u1")
//!         .mark_succeeded()
//!         .complete();
//! }
//!
//! let tx = ctx.transaction().expect("attached above");
//! let mut tx = tx.lock();
//! tx.end();
//! tx.publish("audit.activity");
//!
//! assert_eq!(publisher.messages("audit.activity").len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capture;
mod channel;
mod config;
mod context;
mod error;
mod logging;
mod message;
mod publisher;
pub mod record;
mod vendor;
pub mod web;

pub use capture::decode_json_object;
pub use channel::{
    Channel, EventIdGenerator, FailureHook, PublishFailure, PublishStatus, UuidGenerator,
};
pub use config::CaptureConfig;
pub use context::{attach, retrieve, Ctx};
pub use error::{AuditError, PublishError};
pub use logging::TraceLog;
pub use message::{InboundMessage, MessageCapture};
pub use publisher::{InMemoryPublisher, OutboundMessage, Publisher};
pub use record::{
    Activity, ActivityStatus, Origin, Segment, SegmentBuilder, SharedTransaction, Transaction,
    TransactionBuilder,
};
pub use vendor::process_vendor_transaction;
