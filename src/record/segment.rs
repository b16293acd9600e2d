//! Activity builder bound to a transaction.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::{Activity, ActivityStatus, Transaction};

/// Chainable mutation protocol of an activity segment.
///
/// Every mutator consumes and returns the segment so calls can be chained;
/// [`complete`](Self::complete) consumes it for good, which makes appending
/// the same activity twice impossible.
pub trait SegmentBuilder: Sized {
    /// Records the affected user on the parent transaction.
    fn set_target_user_id(self, user_id: impl Into<String>) -> Self;

    /// Records the affected business on the parent transaction, as a decimal string.
    fn set_target_business_id(self, business_id: i64) -> Self;

    /// Sets the data the action was performed with.
    fn set_request_data(self, data: impl Serialize) -> Self;

    /// Sets the data the action produced.
    fn set_response_data(self, data: impl Serialize) -> Self;

    /// Sets the state snapshot before the change.
    fn set_data_before(self, data: impl Serialize) -> Self;

    /// Sets the state snapshot after the change.
    fn set_data_after(self, data: impl Serialize) -> Self;

    /// Sets whether end users may see the activity.
    fn set_visibility(self, is_visible: bool) -> Self;

    /// Marks the activity successful.
    fn mark_succeeded(self) -> Self;

    /// Stamps the completion time and appends the activity to the parent
    /// transaction.
    fn complete(self);
}

/// In-progress activity holding a mutable borrow of its transaction.
///
/// Obtained from [`TransactionBuilder::begin_action`](super::TransactionBuilder::begin_action).
/// A segment dropped without `complete` records nothing.
#[derive(Debug)]
#[must_use = "a segment records nothing until `complete` is called"]
pub struct Segment<'a> {
    root: &'a mut Transaction,
    activity: Activity,
}

impl<'a> Segment<'a> {
    pub(crate) fn new(root: &'a mut Transaction, activity: Activity) -> Self {
        Self { root, activity }
    }

    /// Returns the activity being built.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }
}

/// Converts caller data into an opaque JSON value; failures store `null`.
fn to_value(field: &str, data: impl Serialize) -> Value {
    serde_json::to_value(data).unwrap_or_else(|err| {
        tracing::warn!(target: "audit_trail", field = field, error = %err, "activity data is not serializable");
        Value::Null
    })
}

impl SegmentBuilder for Segment<'_> {
    fn set_target_user_id(self, user_id: impl Into<String>) -> Self {
        self.root.target_user_id = user_id.into();
        self
    }

    fn set_target_business_id(self, business_id: i64) -> Self {
        self.root.target_business_id = business_id.to_string();
        self
    }

    fn set_request_data(mut self, data: impl Serialize) -> Self {
        self.activity.request_data = to_value("requestData", data);
        self
    }

    fn set_response_data(mut self, data: impl Serialize) -> Self {
        self.activity.response_data = to_value("responseData", data);
        self
    }

    fn set_data_before(mut self, data: impl Serialize) -> Self {
        self.activity.data_before = to_value("dataBefore", data);
        self
    }

    fn set_data_after(mut self, data: impl Serialize) -> Self {
        self.activity.data_after = to_value("dataAfter", data);
        self
    }

    fn set_visibility(mut self, is_visible: bool) -> Self {
        self.activity.is_visible = is_visible;
        self
    }

    fn mark_succeeded(mut self) -> Self {
        self.activity.status = ActivityStatus::Success;
        self
    }

    fn complete(mut self) {
        self.activity.timestamp = Some(Utc::now());
        self.root.activities.push(self.activity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TransactionBuilder;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn segment_records_activity() {
        let mut tx = Transaction::default();

        tx.begin_action("testAction", "testMessage")
            .set_target_user_id("testUserID")
            .set_target_business_id(123)
            .set_data_before("testDataBefore")
            .set_data_after("testDataAfter")
            .mark_succeeded()
            .complete();

        assert_eq!(tx.target_user_id, "testUserID");
        assert_eq!(tx.target_business_id, "123");
        assert_eq!(tx.activities.len(), 1);

        let activity = &tx.activities[0];
        assert_eq!(activity.action, "testAction");
        assert_eq!(activity.message, "testMessage");
        assert_eq!(activity.data_before, json!("testDataBefore"));
        assert_eq!(activity.data_after, json!("testDataAfter"));
        assert_eq!(activity.status, ActivityStatus::Success);
        assert!(activity.timestamp.is_some());
    }

    #[test]
    fn unmarked_segment_completes_as_failed() {
        let mut tx = Transaction::default();
        tx.begin_action("delete", "delete user").complete();

        assert_eq!(tx.activities[0].status, ActivityStatus::Failed);
    }

    #[test]
    fn dropped_segment_appends_nothing() {
        let mut tx = Transaction::default();
        let segment = tx.begin_action("noop", "never completed");
        assert!(segment.activity().timestamp.is_none());
        drop(segment);

        assert!(tx.activities.is_empty());
    }

    #[test]
    fn activities_keep_completion_order() {
        let mut tx = Transaction::default();
        for name in ["first", "second", "third"] {
            tx.begin_action(name, name).complete();
        }

        let names: Vec<&str> = tx.activities.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn target_ids_are_transaction_scoped() {
        let mut tx = Transaction::default();
        tx.begin_action("a", "a").set_target_business_id(1).complete();
        tx.begin_action("b", "b").set_target_business_id(-42).complete();

        assert_eq!(tx.target_business_id, "-42");
    }

    #[test]
    fn structured_data_is_captured() {
        let mut before = BTreeMap::new();
        before.insert("name", "old");

        let mut tx = Transaction::default();
        tx.begin_action("rename", "rename account")
            .set_request_data(json!({"name": "new"}))
            .set_response_data(vec![1, 2, 3])
            .set_data_before(&before)
            .set_visibility(true)
            .complete();

        let activity = &tx.activities[0];
        assert_eq!(activity.request_data, json!({"name": "new"}));
        assert_eq!(activity.response_data, json!([1, 2, 3]));
        assert_eq!(activity.data_before, json!({"name": "old"}));
        assert!(activity.is_visible);
    }

    #[test]
    fn unserializable_data_becomes_null() {
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "tuple keys are not valid JSON object keys");

        let mut tx = Transaction::default();
        tx.begin_action("x", "x").set_request_data(&bad).complete();

        assert_eq!(tx.activities[0].request_data, Value::Null);
    }
}
