//! Message consumer capture demonstration.
//!
//! Every consumed message produces one published activity log, whether the
//! handler succeeds or fails.
//!
//! Run with: `cargo run --example message_capture`

use std::sync::Arc;

use audit_trail::{
    CaptureConfig, Channel, InMemoryPublisher, InboundMessage, MessageCapture, SegmentBuilder,
    Transaction, TransactionBuilder,
};

fn settle_payment(message: &InboundMessage) -> Result<(), String> {
    let payment: serde_json::Value =
        serde_json::from_slice(message.payload()).map_err(|e| e.to_string())?;
    let amount = payment["amount"].as_i64().unwrap_or_default();

    let Some(tx) = message.context().transaction() else {
        return Ok(());
    };
    let mut tx = tx.lock();
    tx.set_event_type("payment.settle");

    let segment = tx
        .begin_action("settle", "settle payment")
        .set_target_business_id(payment["businessId"].as_i64().unwrap_or_default())
        .set_request_data(&payment);

    if amount <= 0 {
        segment.complete();
        return Err(format!("invalid amount {amount}"));
    }

    segment
        .set_response_data(serde_json::json!({"settled": amount}))
        .mark_succeeded()
        .complete();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Message Capture Demo ===\n");

    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = MessageCapture::new(
        Channel::new(publisher.clone()),
        CaptureConfig::new("payments-worker", "audit.activity").with_actor_type("system"),
    );

    let inbox = [
        ("m-1", r#"{"businessId":7,"amount":1500}"#),
        ("m-2", r#"{"businessId":7,"amount":0}"#),
    ];

    for (uuid, payload) in inbox {
        let message = InboundMessage::new(uuid, payload.as_bytes().to_vec())
            .with_metadata("source", "payments");
        match capture.handle(message, settle_payment) {
            Ok(()) => println!("{uuid}: settled"),
            Err(err) => println!("{uuid}: failed ({err})"),
        }
    }

    println!("\n=== Published Activity Logs ===");
    for message in publisher.messages("audit.activity") {
        if let Ok(tx) = serde_json::from_slice::<Transaction>(&message.payload) {
            let statuses: Vec<String> = tx.activities.iter().map(|a| a.status.to_string()).collect();
            println!("event {} | business {} | {:?}", tx.event_id, tx.target_business_id, statuses);
        }
    }
}
