//! HTTP capture demonstration.
//!
//! This example wires the HTTP capture middleware in front of two handlers:
//! 1. Configure capture from environment-style settings
//! 2. Route requests through `HttpCapture`
//! 3. Record activities from handler code via the context
//! 4. Inspect what reached the topic
//!
//! Run with: `cargo run --example http_capture`

use std::sync::Arc;

use audit_trail::web::{HttpCapture, HttpRequest, HttpResponse};
use audit_trail::{
    CaptureConfig, Channel, Ctx, InMemoryPublisher, SegmentBuilder, Transaction,
    TransactionBuilder,
};
use serde_json::json;

/// Creates a user; records one activity per call
fn create_user(ctx: &Ctx, request: HttpRequest) -> HttpResponse {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(request.body()) else {
        return HttpResponse::new(400).with_body(r#"{"error":"invalid body"}"#);
    };

    if let Some(tx) = ctx.transaction() {
        let mut tx = tx.lock();
        tx.set_event_type("user.create")
            .set_actor("kc-admin-1")
            .set_resource("users");

        tx.begin_action("create", "create user")
            .set_target_user_id("u-1001")
            .set_target_business_id(42)
            .set_request_data(&body)
            .set_data_after(json!({"id": "u-1001", "email": body["email"]}))
            .set_visibility(true)
            .mark_succeeded()
            .complete();
    }

    HttpResponse::new(201)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"id":"u-1001"}"#)
}

/// Health check; records nothing
fn health(_ctx: &Ctx, _request: HttpRequest) -> HttpResponse {
    HttpResponse::new(200).with_body(r#"{"status":"ok"}"#)
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== HTTP Capture Demo ===\n");

    // Stand-in for the process environment
    let settings = [
        ("AUDIT_TRAIL_SERVICE_NAME", "users-api"),
        ("AUDIT_TRAIL_TOPIC_NAME", "audit.activity"),
        ("AUDIT_TRAIL_ACTOR_TYPE", "admin"),
        ("AUDIT_TRAIL_RECORD_REQUEST_BODY", "true"),
        ("AUDIT_TRAIL_RECORD_RESPONSE_BODY", "true"),
        ("AUDIT_TRAIL_RECORD_HEADER", "true"),
        ("AUDIT_TRAIL_RECORD_RESPONSE_CODE", "true"),
    ];
    let config = CaptureConfig::from_lookup(|key| {
        settings
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    });
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    let publisher = Arc::new(InMemoryPublisher::new());
    let channel = Channel::new(publisher.clone())
        .on_failure(|failure| eprintln!("publish failed: {}", failure.error));
    let capture = HttpCapture::new(channel, config);

    // Request 1: a handler that records an activity
    let mut request = HttpRequest::new("POST", "/businesses/42/users");
    request.set_route_pattern("/businesses/{businessID}/users");
    request.add_header("Content-Type", "application/json");
    request.add_header("X-Request-Id", "req-0001");
    request.set_body(br#"{"email":"jane@example.com"}"#.to_vec());

    let ctx = Ctx::new().with_trace_id("req-0001");
    let response = capture.handle(&ctx, request, create_user);
    println!("1. POST /businesses/42/users -> {}", response.status());

    // Request 2: nothing recorded, so nothing is published
    let response = capture.handle(&Ctx::new(), HttpRequest::new("GET", "/health"), health);
    println!("2. GET /health -> {}", response.status());

    println!("\n=== Published Activity Logs ===");
    for message in publisher.messages("audit.activity") {
        let Ok(tx) = serde_json::from_slice::<Transaction>(&message.payload) else {
            continue;
        };
        println!("event {} | {} | {}", tx.event_id, tx.target, tx.response_code);
        for activity in &tx.activities {
            println!("  - {} ({}): {}", activity.action, activity.status, activity.message);
        }
    }
    println!("\ntotal: {}", publisher.len());
}
