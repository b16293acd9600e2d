//! Transaction/Activity recording model.
//!
//! This module provides:
//! - `Transaction`: record of one inbound request or message
//! - `Activity`: one discrete business action taken while handling it
//! - `Segment`: short-lived builder that appends one `Activity`
//! - `TransactionBuilder` / `SegmentBuilder`: the mutation protocol as traits
//!
//! Activities reach a Transaction only through `Segment::complete`, which
//! consumes the segment. The serialized Transaction is the wire payload sent
//! to the publishing channel.

mod activity;
mod segment;
mod transaction;

pub use activity::{Activity, ActivityStatus};
pub use segment::{Segment, SegmentBuilder};
pub use transaction::{Origin, SharedTransaction, Transaction, TransactionBuilder};
pub(crate) use transaction::PendingPublish;
