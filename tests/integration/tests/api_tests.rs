//! API Integration Tests
//!
//! Both servers run over the in-memory store, so no external services are
//! needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use folio_core::ReactionType;
use folio_service::dto::{CommentPageView, CommentView, DeleteCommentOutcome, ToggleView};
use integration_tests::{
    assert_error, assert_json, assert_status, fixtures::*, TestServer,
};
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"], "ok");
}

// ============================================================================
// Reaction Tests
// ============================================================================

#[tokio::test]
async fn test_toggle_switch_and_undo() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let token = server.member_token(unique_user_id()).unwrap();
    let path = reactions_path(project);

    let response = server
        .post_auth(&path, &token, &ToggleRequest::new("like"))
        .await
        .unwrap();
    let view: ToggleView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.summary.counts[&ReactionType::Like], 1);
    assert_eq!(view.summary.total, 1);

    let response = server
        .post_auth(&path, &token, &ToggleRequest::new("love"))
        .await
        .unwrap();
    let view: ToggleView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.summary.counts[&ReactionType::Like], 0);
    assert_eq!(view.summary.counts[&ReactionType::Love], 1);
    assert_eq!(view.summary.total, 1);
    assert_eq!(view.summary.viewer_reaction, Some(ReactionType::Love));

    let response = server
        .post_auth(&path, &token, &ToggleRequest::new("love"))
        .await
        .unwrap();
    let view: ToggleView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(view.summary.counts[&ReactionType::Love], 0);
    assert_eq!(view.summary.total, 0);
    assert_eq!(view.summary.viewer_reaction, None);
}

#[tokio::test]
async fn test_anonymous_toggle_changes_nothing() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let path = reactions_path(project);

    let response = server.post(&path, &ToggleRequest::new("like")).await.unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "AUTH_REQUIRED");

    let response = server.get(&path).await.unwrap();
    let summary: folio_service::dto::ReactionSummaryView =
        assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(summary.total, 0);
    assert!(summary.counts.values().all(|count| *count == 0));
}

#[tokio::test]
async fn test_summary_counts_every_reactor() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let path = reactions_path(project);

    for reaction in ["fire", "fire", "clap"] {
        let token = server.member_token(unique_user_id()).unwrap();
        let response = server
            .post_auth(&path, &token, &ToggleRequest::new(reaction))
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    let viewer = server.member_token(unique_user_id()).unwrap();
    let response = server.get_auth(&path, &viewer).await.unwrap();
    let summary: folio_service::dto::ReactionSummaryView =
        assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(summary.counts[&ReactionType::Fire], 2);
    assert_eq!(summary.counts[&ReactionType::Clap], 1);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.viewer_reaction, None);
}

#[tokio::test]
async fn test_unknown_reaction_type_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let token = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(
            &reactions_path(unique_project_id()),
            &token,
            &ToggleRequest::new("sparkles"),
        )
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_bad_token_is_rejected() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post_auth(
            &reactions_path(unique_project_id()),
            "not-a-jwt",
            &ToggleRequest::new("like"),
        )
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "INVALID_TOKEN");
}

// ============================================================================
// Comment Tests
// ============================================================================

#[tokio::test]
async fn test_reply_updates_parent_count() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let token = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(&comments_path(project), &token, &NewComment::top_level("First!"))
        .await
        .unwrap();
    let parent: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(parent.depth, 0);
    assert_eq!(parent.replies_count, 0);
    assert!(parent.can_reply);

    let response = server
        .post_auth(
            &comments_path(project),
            &token,
            &NewComment::reply(parent.id, "Replying"),
        )
        .await
        .unwrap();
    let reply: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(reply.depth, 1);
    assert_eq!(reply.parent_comment_id, Some(parent.id));

    let response = server.get(&comment_path(parent.id)).await.unwrap();
    let parent: CommentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(parent.replies_count, 1);

    let response = server
        .get(&format!("{}/replies", comment_path(parent.id)))
        .await
        .unwrap();
    let replies: Vec<CommentView> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, reply.id);
}

#[tokio::test]
async fn test_top_level_listing_is_newest_first() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let token = server.member_token(unique_user_id()).unwrap();

    let mut ids = Vec::new();
    for body in ["one", "two", "three"] {
        let response = server
            .post_auth(&comments_path(project), &token, &NewComment::top_level(body))
            .await
            .unwrap();
        let view: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();
        ids.push(view.id);
    }

    let response = server
        .get(&format!("{}?limit=2", comments_path(project)))
        .await
        .unwrap();
    let page: CommentPageView = assert_json(response, StatusCode::OK).await.unwrap();
    let listed: Vec<_> = page.comments.iter().map(|c| c.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1]]);

    let before = page.next_before.expect("first page should have a cursor");
    let response = server
        .get(&format!("{}?limit=2&before={before}", comments_path(project)))
        .await
        .unwrap();
    let page: CommentPageView = assert_json(response, StatusCode::OK).await.unwrap();
    let listed: Vec<_> = page.comments.iter().map(|c| c.id).collect();
    assert_eq!(listed, vec![ids[0]]);
    assert!(page.next_before.is_none());
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let token = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(
            &comments_path(unique_project_id()),
            &token,
            &NewComment::top_level("   "),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_edit_by_stranger_is_denied() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let author = server.member_token(unique_user_id()).unwrap();
    let stranger = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(&comments_path(project), &author, &NewComment::top_level("Original"))
        .await
        .unwrap();
    let comment: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .patch_auth(&comment_path(comment.id), &stranger, &EditComment::new("Hijacked"))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(code, "PERMISSION_DENIED");

    let response = server.get(&comment_path(comment.id)).await.unwrap();
    let unchanged: CommentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(unchanged.content, "Original");
    assert!(!unchanged.edited);
}

#[tokio::test]
async fn test_author_and_moderator_can_edit() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let author = server.member_token(unique_user_id()).unwrap();
    let moderator = server.moderator_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(&comments_path(project), &author, &NewComment::top_level("Draft"))
        .await
        .unwrap();
    let comment: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .patch_auth(&comment_path(comment.id), &author, &EditComment::new("Final"))
        .await
        .unwrap();
    let edited: CommentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(edited.content, "Final");
    assert!(edited.edited);

    let response = server
        .patch_auth(&comment_path(comment.id), &moderator, &EditComment::new("Moderated"))
        .await
        .unwrap();
    let edited: CommentView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(edited.content, "Moderated");
}

#[tokio::test]
async fn test_delete_with_replies_needs_confirmation() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let token = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(&comments_path(project), &token, &NewComment::top_level("Parent"))
        .await
        .unwrap();
    let parent: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();
    let response = server
        .post_auth(
            &comments_path(project),
            &token,
            &NewComment::reply(parent.id, "Child"),
        )
        .await
        .unwrap();
    let child: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .delete_auth(&comment_path(parent.id), &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(code, "CONFIRMATION_REQUIRED");

    let response = server
        .delete_auth(&format!("{}?confirm=true", comment_path(parent.id)), &token)
        .await
        .unwrap();
    let outcome: DeleteCommentOutcome = assert_json(response, StatusCode::OK).await.unwrap();
    let tombstone = outcome.tombstoned.expect("parent with replies is kept");
    assert!(tombstone.deleted);
    assert!(tombstone.author.is_none());
    assert!(!tombstone.can_reply);

    let response = server
        .get(&format!("{}/replies", comment_path(parent.id)))
        .await
        .unwrap();
    let replies: Vec<CommentView> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, child.id);
}

#[tokio::test]
async fn test_delete_leaf_removes_it() {
    let server = TestServer::start().await.unwrap();
    let project = unique_project_id();
    let token = server.member_token(unique_user_id()).unwrap();

    let response = server
        .post_auth(&comments_path(project), &token, &NewComment::top_level("Oops"))
        .await
        .unwrap();
    let comment: CommentView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .delete_auth(&comment_path(comment.id), &token)
        .await
        .unwrap();
    let outcome: DeleteCommentOutcome = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(outcome.removed, vec![comment.id]);
    assert!(outcome.tombstoned.is_none());

    let response = server.get(&comment_path(comment.id)).await.unwrap();
    let code = assert_error(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(code, "UNKNOWN_COMMENT");
}
