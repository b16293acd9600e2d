//! Integration tests for the HTTP capture middleware.
//!
//! These tests drive complete requests through `HttpCapture` and inspect
//! what reached the publisher.

use std::sync::Arc;

use audit_trail::web::{HttpCapture, HttpRequest, HttpResponse, IntoHttpRequest};
use audit_trail::{
    CaptureConfig, Channel, Ctx, InMemoryPublisher, PublishError, SegmentBuilder, Transaction,
    TransactionBuilder,
};
use parking_lot::Mutex;
use serde_json::json;

const TOPIC: &str = "testTopic";

fn config() -> CaptureConfig {
    CaptureConfig::new("testService", TOPIC)
        .with_actor_type("testActor")
        .with_record_request_body(true)
        .with_record_header(true)
        .with_record_response_body(true)
        .with_record_response_code(true)
}

fn success_handler(_ctx: &Ctx, _request: HttpRequest) -> HttpResponse {
    HttpResponse::new(200)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"message":"success"}"#)
}

fn published(publisher: &InMemoryPublisher) -> Vec<Transaction> {
    publisher
        .messages(TOPIC)
        .iter()
        .map(|m| serde_json::from_slice(&m.payload).expect("payload decodes"))
        .collect()
}

#[test]
fn no_activities_no_publish() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(
        Channel::new(publisher.clone()),
        config().with_publish_when_no_activities(false),
    );

    let response = capture.handle(&Ctx::new(), HttpRequest::new("GET", "/test"), success_handler);

    assert_eq!(response.status(), 200);
    assert!(publisher.is_empty());
}

#[test]
fn no_activities_forced_publish() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(
        Channel::new(publisher.clone()),
        config().with_publish_when_no_activities(true),
    );

    capture.handle(&Ctx::new(), HttpRequest::new("GET", "/test"), success_handler);

    let sent = published(&publisher);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].response_code, 200);
    assert_eq!(sent[0].response_body.as_ref().unwrap()["message"], "success");
}

#[test]
fn full_request_is_recorded() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(
        Channel::new(publisher.clone()),
        config().with_publish_when_no_activities(true),
    );

    let mut request = HttpRequest::new("POST", "/test");
    request.add_header("Content-Type", "application/json");
    request.set_body(serde_json::to_vec(&json!({"message": "test"})).unwrap());

    capture.handle(&Ctx::new(), request, |ctx, request| {
        // The body is still readable by the handler
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        assert_eq!(body["message"], "test");

        let tx = ctx.transaction().expect("middleware attached a transaction");
        let mut tx = tx.lock();
        tx.set_event_type("testEvent").start();

        tx.begin_action("testAction", "testMessage")
            .set_target_user_id("testUserID")
            .set_target_business_id(123)
            .set_data_before("testDataBefore")
            .set_data_after("testDataAfter")
            .set_request_data("testRequestData")
            .set_response_data("testResponseData")
            .mark_succeeded()
            .complete();

        success_handler(ctx, request)
    });

    let sent = published(&publisher);
    assert_eq!(sent.len(), 1);
    let result = &sent[0];

    assert_eq!(result.service, "testService");
    assert_eq!(result.event_type, "testEvent");
    assert!(result.time_start.is_some());
    assert!(result.time_end.is_some());
    assert_eq!(result.actor_type, "testActor");
    assert_eq!(result.target, "POST /test");
    assert_eq!(result.request_body.as_ref().unwrap()["message"], "test");
    assert_eq!(result.header.as_ref().unwrap()["Content-Type"], json!(["application/json"]));
    assert_eq!(result.response_body.as_ref().unwrap()["message"], "success");
    assert_eq!(result.response_code, 200);
    assert_eq!(result.target_user_id, "testUserID");
    assert_eq!(result.target_business_id, "123");

    assert_eq!(result.activities.len(), 1);
    let activity = &result.activities[0];
    assert_eq!(activity.action, "testAction");
    assert_eq!(activity.message, "testMessage");
    assert_eq!(activity.data_before, "testDataBefore");
    assert_eq!(activity.data_after, "testDataAfter");
    assert_eq!(activity.request_data, "testRequestData");
    assert_eq!(activity.response_data, "testResponseData");
    assert!(activity.timestamp.is_some());
    assert!(activity.succeeded());
}

#[test]
fn framework_request_conversion() {
    // Stand-in for a router's request type
    struct RoutedRequest {
        method: &'static str,
        uri: &'static str,
        pattern: &'static str,
        body: &'static [u8],
    }

    impl IntoHttpRequest for RoutedRequest {
        fn into_http_request(self) -> HttpRequest {
            let mut request = HttpRequest::new(self.method, self.uri);
            request.set_route_pattern(self.pattern);
            request.set_body(self.body.to_vec());
            request
        }
    }

    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(Channel::new(publisher.clone()), config());

    capture.handle(
        &Ctx::new(),
        RoutedRequest {
            method: "PUT",
            uri: "/businesses/77/users/5",
            pattern: "/businesses/{bid}/users/{uid}",
            body: br#"{"role":"owner"}"#,
        },
        |ctx, _| {
            if let Some(tx) = ctx.transaction() {
                tx.lock()
                    .begin_action("assign_role", "assign owner role")
                    .set_target_business_id(77)
                    .set_target_user_id("5")
                    .complete();
            }
            HttpResponse::new(403).with_body(r#"{"error":"forbidden"}"#)
        },
    );

    let sent = &published(&publisher)[0];
    assert_eq!(sent.target, "PUT /businesses/{bid}/users/{uid}");
    assert_eq!(sent.target_business_id, "77");
    assert_eq!(sent.response_code, 403);
    assert!(!sent.activities[0].succeeded());
}

#[test]
fn publish_failure_does_not_affect_response() {
    let failures = Arc::new(Mutex::new(0usize));
    let counter = failures.clone();
    let publisher = Arc::new(InMemoryPublisher::failing(PublishError::Closed));
    let capture = HttpCapture::new(
        Channel::new(publisher).on_failure(move |_| *counter.lock() += 1),
        config().with_publish_when_no_activities(true),
    );

    let response = capture.handle(&Ctx::new(), HttpRequest::new("GET", "/test"), success_handler);

    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), br#"{"message":"success"}"#);
    assert_eq!(*failures.lock(), 1);
}

#[test]
fn each_request_gets_its_own_transaction() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(Channel::new(publisher.clone()), config());

    for path in ["/a", "/b", "/c"] {
        capture.handle(&Ctx::new(), HttpRequest::new("GET", path), |ctx, _| {
            if let Some(tx) = ctx.transaction() {
                tx.lock().begin_action("read", "read resource").complete();
            }
            HttpResponse::new(200)
        });
    }

    let sent = published(&publisher);
    let targets: Vec<&str> = sent.iter().map(|t| t.target.as_str()).collect();
    assert_eq!(targets, vec!["GET /a", "GET /b", "GET /c"]);
    assert!(sent.iter().all(|t| t.activities.len() == 1));

    let mut ids: Vec<&str> = sent.iter().map(|t| t.event_id.as_str()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn header_names_are_canonicalized() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let capture = HttpCapture::new(
        Channel::new(publisher.clone()),
        config().with_publish_when_no_activities(true),
    );

    // HTTP/2 clients send lower-case names
    let mut request = HttpRequest::new("GET", "/test");
    request.add_header("content-type", "application/json");
    request.add_header("Accept", "a");
    request.add_header("accept", "b");

    capture.handle(&Ctx::new(), request, success_handler);

    let header = published(&publisher)[0].header.clone().unwrap();
    assert_eq!(header.len(), 2);
    assert_eq!(header["Content-Type"], json!(["application/json"]));
    assert_eq!(header["Accept"], json!(["a", "b"]));
}

#[test]
fn failure_hook_may_inspect_the_shared_transaction() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::new(Mutex::new(None));

    let hook_seen = seen.clone();
    let hook_tx = captured.clone();
    let publisher = Arc::new(InMemoryPublisher::failing(PublishError::Closed));
    let channel = Channel::new(publisher).on_failure(move |_| {
        // Locks the same transaction the middleware just published
        let tx: Option<audit_trail::SharedTransaction> = hook_tx.lock().clone();
        if let Some(tx) = tx {
            hook_seen.lock().push(tx.lock().activities.len());
        }
    });
    let capture = HttpCapture::new(channel, config());

    capture.handle(&Ctx::new(), HttpRequest::new("GET", "/test"), |ctx, _| {
        let tx = ctx.transaction().expect("transaction attached");
        tx.lock().begin_action("read", "read resource").complete();
        *captured.lock() = Some(tx);
        HttpResponse::new(200)
    });

    assert_eq!(*seen.lock(), vec![1]);
}
