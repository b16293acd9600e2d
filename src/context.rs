use crate::logging::TraceLog;
use crate::record::SharedTransaction;

/// Request-scoped context threaded explicitly through handler code.
///
/// A `Ctx` carries at most one active [`Transaction`](crate::Transaction)
/// and an optional trace id used to correlate log events. It is cheap to
/// clone; derived contexts never mutate their parent.
///
/// # Attaching and retrieving
///
/// ```
/// use audit_trail::{Ctx, Transaction};
///
/// let root = Ctx::new().with_trace_id("trace-1");
/// let ctx = root.with_transaction(Transaction::new("svc").into_shared());
///
/// assert!(ctx.transaction().is_some());
/// // The parent is untouched
/// assert!(root.transaction().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    trace_id: Option<String>,
    transaction: Option<SharedTransaction>,
}

impl Ctx {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a derived context carrying `trace_id`.
    pub fn with_trace_id(&self, trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
            transaction: self.transaction.clone(),
        }
    }

    /// Returns a derived context carrying `transaction`.
    ///
    /// Attaching again shadows the previous transaction in the derived
    /// context only.
    pub fn with_transaction(&self, transaction: SharedTransaction) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            transaction: Some(transaction),
        }
    }

    /// Returns the attached transaction, if any.
    pub fn transaction(&self) -> Option<SharedTransaction> {
        self.transaction.clone()
    }

    /// Returns the trace id, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns a logger tagged with this context's trace id.
    pub fn log(&self) -> TraceLog<'_> {
        TraceLog::new(self.trace_id())
    }
}

/// Returns a context derived from `ctx` carrying `transaction`.
pub fn attach(ctx: &Ctx, transaction: SharedTransaction) -> Ctx {
    ctx.with_transaction(transaction)
}

/// Returns the transaction attached to `ctx`.
///
/// A missing context or a context without a transaction yields `None`;
/// callers treat that as "no active transaction" and skip recording.
///
/// ```
/// use audit_trail::{retrieve, Ctx};
///
/// assert!(retrieve(None).is_none());
/// assert!(retrieve(Some(&Ctx::new())).is_none());
/// ```
pub fn retrieve(ctx: Option<&Ctx>) -> Option<SharedTransaction> {
    ctx.and_then(Ctx::transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{SegmentBuilder, Transaction, TransactionBuilder};
    use std::sync::Arc;

    #[test]
    fn empty_context_has_no_transaction() {
        let ctx = Ctx::new();
        assert!(ctx.transaction().is_none());
        assert!(ctx.trace_id().is_none());
    }

    #[test]
    fn retrieve_is_nil_safe() {
        assert!(retrieve(None).is_none());
        assert!(retrieve(Some(&Ctx::default())).is_none());
    }

    #[test]
    fn attach_then_retrieve_returns_same_transaction() {
        let shared = Transaction::new("svc").into_shared();
        let ctx = attach(&Ctx::new(), shared.clone());

        let found = retrieve(Some(&ctx)).expect("transaction attached");
        assert!(Arc::ptr_eq(&found, &shared));
    }

    #[test]
    fn attaching_again_shadows_without_mutating_parent() {
        let first = Transaction::new("first").into_shared();
        let second = Transaction::new("second").into_shared();

        let parent = Ctx::new().with_transaction(first.clone());
        let child = parent.with_transaction(second.clone());

        assert!(Arc::ptr_eq(&parent.transaction().unwrap(), &first));
        assert!(Arc::ptr_eq(&child.transaction().unwrap(), &second));
    }

    #[test]
    fn trace_id_survives_attach() {
        let ctx = Ctx::new()
            .with_trace_id("trace-42")
            .with_transaction(Transaction::default().into_shared());

        assert_eq!(ctx.trace_id(), Some("trace-42"));
        assert_eq!(ctx.log().trace_id(), Some("trace-42"));
    }

    #[test]
    fn handler_records_through_context() {
        let shared = Transaction::new("svc").into_shared();
        let ctx = Ctx::new().with_transaction(shared.clone());

        if let Some(tx) = ctx.transaction() {
            tx.lock()
                .begin_action("create", "create user")
                .mark_succeeded()
                .complete();
        }

        assert_eq!(shared.lock().activities.len(), 1);
    }
}
