mod common;

use common::RecordingTransport;
use oxn_client::{
    ClientError, Method, Notice, RequestClient, TransportError, FALLBACK_ERROR,
};
use serde_json::json;

#[tokio::test]
async fn success_sets_data_and_notice() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/experiments", json!([1, 2]));
    let client = RequestClient::get(transport, "/experiments");

    assert_eq!(client.trigger().await, Some(json!([1, 2])));
    let state = client.state();
    assert_eq!(state.data, Some(json!([1, 2])));
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.notice, Some(Notice::Success));
}

#[tokio::test]
async fn error_prefers_server_message_then_transport_text_then_fallback() {
    let transport = RecordingTransport::new();
    transport
        .fail(Method::Post, "/a", 400, Some("name is required"))
        .fail(Method::Post, "/b", 500, None)
        .respond(Method::Post, "/c", Err(TransportError::Request(String::new())));

    let a = RequestClient::post(transport.clone(), "/a", json!({}));
    assert_eq!(a.trigger().await, None);
    assert_eq!(a.error().as_deref(), Some("name is required"));
    assert_eq!(
        a.state().notice,
        Some(Notice::Failure("name is required".into()))
    );

    let b = RequestClient::post(transport.clone(), "/b", json!({})).quiet();
    b.trigger().await;
    assert_eq!(b.error().as_deref(), Some("HTTP 500"));
    assert_eq!(b.state().notice, None);

    let c = RequestClient::post(transport, "/c", json!({}));
    c.trigger().await;
    assert_eq!(c.error().as_deref(), Some(FALLBACK_ERROR));
}

#[tokio::test]
async fn trigger_clears_previous_error() {
    let transport = RecordingTransport::new();
    transport
        .fail(Method::Get, "/x", 503, Some("busy"))
        .ok(Method::Get, "/x", json!({"ok": true}));
    let client = RequestClient::get(transport, "/x");

    client.trigger().await;
    assert_eq!(client.error().as_deref(), Some("busy"));
    client.trigger().await;
    assert_eq!(client.error(), None);
    assert_eq!(client.data(), Some(json!({"ok": true})));
}

#[tokio::test]
async fn automatic_get_fires_once_per_client() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/experiments", json!([]));
    let client = RequestClient::get(transport.clone(), "/experiments");
    let clone = client.clone();

    assert_eq!(client.auto_fetch().await, Some(json!([])));
    assert_eq!(clone.auto_fetch().await, None);
    assert_eq!(transport.calls().len(), 1);

    // explicit triggers are never suppressed
    clone.trigger().await;
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn manual_and_post_clients_never_auto_fire() {
    let transport = RecordingTransport::new();
    let manual = RequestClient::get(transport.clone(), "/experiments").manual();
    let post = RequestClient::post(transport.clone(), "/experiments", json!({}));
    assert_eq!(manual.auto_fetch().await, None);
    assert_eq!(post.auto_fetch().await, None);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn array_body_is_not_a_status() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/experiments/1/status", json!(["not", "a", "status"]));
    let client = RequestClient::get(transport, "/experiments/1/status");
    let err = client
        .fetch_object::<oxn_core::StatusUpdate>()
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(client.error().is_some());
    assert!(matches!(client.state().notice, Some(Notice::Failure(_))));
}

#[tokio::test]
async fn undecodable_payload_is_a_failure_not_a_success() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/count", json!("many"));
    let client = RequestClient::get(transport, "/count");

    let err = client.fetch::<u32>().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    let state = client.state();
    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert!(matches!(state.notice, Some(Notice::Failure(ref m)) if m.contains("/count")));
}

#[tokio::test]
async fn fetch_object_accepts_objects() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/experiments/1/status", json!({"status": "IN_PROGRESS"}));
    let client = RequestClient::get(transport, "/experiments/1/status");
    let update = client.fetch_object::<oxn_core::StatusUpdate>().await.unwrap();
    assert_eq!(update.status, oxn_core::ExperimentStatus::InProgress);
    assert_eq!(client.state().notice, Some(Notice::Success));
}

#[tokio::test]
async fn subscribers_observe_loading_transitions() {
    let transport = RecordingTransport::new();
    transport.ok(Method::Get, "/x", json!(1));
    let client = RequestClient::get(transport, "/x");
    let mut rx = client.subscribe();
    assert!(!rx.borrow_and_update().loading);

    client.trigger().await;
    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!(1)));
}
