//! Pieces shared by the HTTP and message capture middlewares.

use serde_json::{Map, Value};

use crate::channel::Channel;
use crate::config::CaptureConfig;
use crate::record::{Origin, Transaction};

/// Builds the initial transaction from static configuration.
pub(crate) fn new_transaction(config: &CaptureConfig, origin: Origin, channel: &Channel) -> Transaction {
    Transaction {
        service: config.service_name.clone(),
        actor_type: config.actor_type.clone(),
        actor_email: config.actor_email.clone(),
        origin,
        channel: Some(channel.clone()),
        ..Transaction::default()
    }
}

/// Decodes `bytes` as a JSON object.
///
/// Anything else (invalid JSON, arrays, scalars, empty input) yields `None`
/// so the captured field is left empty.
pub fn decode_json_object(bytes: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
