//! Activity record and status types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a recorded activity.
///
/// Activities start out as [`ActivityStatus::Failed`] and only become
/// successful when explicitly marked, so an action that bails out early is
/// recorded as a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    /// The action completed
    Success,
    /// The action failed or never reported success
    #[default]
    Failed,
}

impl ActivityStatus {
    /// Returns the wire representation (`"success"` or `"failed"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discrete business action performed while handling a transaction.
///
/// The data fields hold opaque JSON values; their only contract is that they
/// serialize into the transport payload.
///
/// # Example
///
/// ```
/// use audit_trail::{Activity, ActivityStatus};
///
/// let activity = Activity::new("create", "create user");
/// assert_eq!(activity.status, ActivityStatus::Failed);
/// assert!(activity.timestamp.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    /// Machine-readable action name (e.g. "create")
    pub action: String,
    /// Human-readable message, shown to end users in the CRM
    pub message: String,
    /// Whether the action succeeded
    pub status: ActivityStatus,
    /// Input the action was performed with
    pub request_data: Value,
    /// Output the action produced
    pub response_data: Value,
    /// State snapshot before the change
    pub data_before: Value,
    /// State snapshot after the change
    pub data_after: Value,
    /// Completion time; stamped by `Segment::complete`
    pub timestamp: Option<DateTime<Utc>>,
    /// Whether end users may see this activity
    pub is_visible: bool,
}

impl Activity {
    /// Creates an in-progress activity with a failed status and no timestamp.
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Returns true if the activity was marked successful.
    pub fn succeeded(&self) -> bool {
        self.status == ActivityStatus::Success
    }
}
