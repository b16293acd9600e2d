//! Finalizing transactions that were built outside a capture middleware.
//!
//! Callbacks from third-party vendors (payment providers, KYC services, ...)
//! arrive on endpoints whose calling code assembles the transaction itself.
//! This helper gives them the same end-and-publish step the middlewares run.

use crate::channel::{Channel, PublishStatus};
use crate::config::CaptureConfig;
use crate::context::Ctx;
use crate::record::{SharedTransaction, TransactionBuilder};

/// Stamps the end time on `transaction` and publishes it to the configured
/// topic through `channel`.
///
/// `channel` replaces any channel already bound to the transaction. Log
/// events carry the trace id of `ctx`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use audit_trail::{
///     process_vendor_transaction, CaptureConfig, Channel, Ctx, InMemoryPublisher,
///     PublishStatus, SegmentBuilder, Transaction, TransactionBuilder,
/// };
///
/// let publisher = Arc::new(InMemoryPublisher::new());
/// let channel = Channel::new(publisher.clone());
/// let config = CaptureConfig::new("payments", "audit.activity");
///
/// let mut tx = Transaction::new("payments");
/// tx.set_event_type("vendor_callback").start();
/// tx.begin_action("settle", "payment settled").mark_succeeded().complete();
///
/// let status = process_vendor_transaction(&Ctx::new(), &tx.into_shared(), &channel, &config);
///
/// assert_eq!(status, PublishStatus::Published);
/// assert_eq!(publisher.messages("audit.activity").len(), 1);
/// ```
pub fn process_vendor_transaction(
    ctx: &Ctx,
    transaction: &SharedTransaction,
    channel: &Channel,
    config: &CaptureConfig,
) -> PublishStatus {
    let ctx = ctx.with_transaction(transaction.clone());
    let log = ctx.log();

    let pending = {
        let mut tx = transaction.lock();
        tx.set_channel(channel.clone());
        tx.end();
        tx.prepare_publish(&config.topic_name, &log)
    };
    match pending {
        Ok(pending) => pending.send(&log),
        Err(status) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::InMemoryPublisher;
    use crate::record::Transaction;
    use std::sync::Arc;

    #[test]
    fn binds_channel_ends_and_publishes() {
        let publisher = Arc::new(InMemoryPublisher::new());
        let channel = Channel::new(publisher.clone());
        let shared = Transaction::new("svc").into_shared();
        shared.lock().start();

        let status = process_vendor_transaction(
            &Ctx::new(),
            &shared,
            &channel,
            &CaptureConfig::new("svc", "audit"),
        );

        assert_eq!(status, PublishStatus::Published);
        let tx = shared.lock();
        assert!(tx.time_end.is_some());
        assert!(tx.is_published());
        assert_eq!(publisher.messages("audit")[0].key, tx.event_id);
    }

    #[test]
    fn given_channel_replaces_a_bound_one() {
        let bound = Arc::new(InMemoryPublisher::new());
        let given = Arc::new(InMemoryPublisher::new());
        let mut tx = Transaction::new("svc");
        tx.set_channel(Channel::new(bound.clone()));

        let status = process_vendor_transaction(
            &Ctx::new(),
            &tx.into_shared(),
            &Channel::new(given.clone()),
            &CaptureConfig::new("svc", "audit"),
        );

        assert_eq!(status, PublishStatus::Published);
        assert_eq!(given.len(), 1);
        assert!(bound.is_empty());
    }
}
