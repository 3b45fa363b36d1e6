//! Gateway Integration Tests
//!
//! A gateway client subscribes to a project and watches changes made
//! through the REST API on the same service context.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use folio_service::dto::CommentView;
use folio_service::realtime::ChangeEvent;
use integration_tests::{assert_json, assert_status, fixtures::*, TestServer};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_subscribe_then_receive_toggle() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let mut client = server.connect_gateway().await.unwrap();

    client.subscribe(project).await.unwrap();
    let subscribed = client.next_dispatch("SUBSCRIBED").await.unwrap();
    assert_eq!(subscribed["d"]["project_id"], project.to_string());

    let token = server.member_token(unique_user_id()).unwrap();
    let response = server
        .post_auth(&reactions_path(project), &token, &ToggleRequest::new("wow"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let frame = client.next_dispatch("CHANGE").await.unwrap();
    let change: ChangeEvent = serde_json::from_value(frame["d"].clone()).unwrap();
    assert_eq!(change.project_id.to_string(), project.to_string());
    assert_eq!(change.event_type, "REACTION_ADDED");
    let view = serde_json::to_value(&change.view).unwrap();
    assert_eq!(view["view"], "reactions");
    assert_eq!(view["data"]["summary"]["counts"]["wow"], 1);
    assert_eq!(view["data"]["summary"]["total"], 1);
}

#[tokio::test]
async fn test_comment_reaches_subscriber() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let mut client = server.connect_gateway().await.unwrap();

    client.subscribe(project).await.unwrap();
    client.next_dispatch("SUBSCRIBED").await.unwrap();

    let token = server.member_token(unique_user_id()).unwrap();
    let response = server
        .post_auth(&comments_path(project), &token, &NewComment::top_level("Hello"))
        .await
        .unwrap();
    let created: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let frame = client.next_dispatch("CHANGE").await.unwrap();
    assert_eq!(frame["d"]["event_type"], "COMMENT_ADDED");
    assert_eq!(frame["d"]["entity_id"], created.id.to_string());
}

#[tokio::test]
async fn test_unsubscribed_project_is_silent() {
    let server = TestServer::start().await.unwrap();
    let watched = unique_project_id();
    let other = unique_project_id();
    let mut client = server.connect_gateway().await.unwrap();

    client.subscribe(watched).await.unwrap();
    client.next_dispatch("SUBSCRIBED").await.unwrap();

    let token = server.member_token(unique_user_id()).unwrap();
    for project in [other, watched] {
        let response = server
            .post_auth(&reactions_path(project), &token, &ToggleRequest::new("idea"))
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    // The first change seen belongs to the watched project
    let frame = client.next_dispatch("CHANGE").await.unwrap();
    assert_eq!(frame["d"]["project_id"], watched.to_string());
}

#[tokio::test]
async fn test_subscribe_to_invalid_project_fails_softly() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect_gateway().await.unwrap();

    client.send_op(3, json!({ "project_id": "0" })).await.unwrap();
    let failed = client.next_dispatch("SUBSCRIBE_FAILED").await.unwrap();
    assert_eq!(failed["d"]["code"], "INVALID_ARGUMENT");

    // Connection is still usable
    client.send_op(1, json!(null)).await.unwrap();
    let ack = client.next_frame().await.unwrap();
    assert_eq!(ack["op"], 11);
}

#[tokio::test]
async fn test_identify_with_valid_token() {
    let server = TestServer::start().await.unwrap();
    let user_id = unique_user_id();
    let token = server.member_token(user_id).unwrap();
    let mut client = server.connect_gateway().await.unwrap();

    client.identify(&token).await.unwrap();
    let ready = client.next_dispatch("READY").await.unwrap();
    assert_eq!(ready["d"]["user_id"], user_id.to_string());
    assert!(ready["d"]["session_id"].as_str().is_some());
}

#[tokio::test]
async fn test_identify_with_bad_token_closes() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect_gateway().await.unwrap();

    client.identify("not-a-jwt").await.unwrap();
    let code = client.expect_close().await.unwrap();
    assert_eq!(code, 4004);
}

#[tokio::test]
async fn test_garbage_frame_closes_with_decode_error() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect_gateway().await.unwrap();

    client.send_op(99, json!({})).await.unwrap();
    let code = client.expect_close().await.unwrap();
    assert_eq!(code, 4002);
}
