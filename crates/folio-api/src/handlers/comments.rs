//! Comment handlers
//!
//! Endpoints for project comments and their replies.

use axum::{extract::State, Json};
use folio_service::dto::{
    CommentPageQuery, CommentPageView, CommentView, CreateCommentRequest, DeleteCommentOutcome,
    DeleteCommentQuery, UpdateCommentRequest,
};
use folio_service::CommentService;

use crate::extractors::{Caller, IdPath, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Top-level comments, newest first
///
/// GET /projects/{project_id}/comments?before=&limit=
pub async fn list_comments(
    State(state): State<AppState>,
    IdPath(project_id): IdPath,
    ValidatedQuery(query): ValidatedQuery<CommentPageQuery>,
) -> ApiResult<Json<CommentPageView>> {
    let service = CommentService::new(state.service_context());
    Ok(Json(service.list_top_level(project_id, query.page()).await?))
}

/// Post a comment or a reply
///
/// POST /projects/{project_id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(project_id): IdPath,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<Created<Json<CommentView>>> {
    let service = CommentService::new(state.service_context());
    let view = service
        .add_comment(&auth, project_id, &request.content, request.parent_comment_id)
        .await?;
    Ok(Created(Json(view)))
}

/// GET /comments/{comment_id}
pub async fn get_comment(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath,
) -> ApiResult<Json<CommentView>> {
    let service = CommentService::new(state.service_context());
    Ok(Json(service.get_comment(comment_id).await?))
}

/// Edit a comment
///
/// PATCH /comments/{comment_id}
pub async fn update_comment(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(comment_id): IdPath,
    ValidatedJson(request): ValidatedJson<UpdateCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    let service = CommentService::new(state.service_context());
    let view = service
        .edit_comment(&auth, comment_id, &request.content)
        .await?;
    Ok(Json(view))
}

/// Delete a comment; `?confirm=true` is required while it has replies
///
/// DELETE /comments/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(comment_id): IdPath,
    ValidatedQuery(query): ValidatedQuery<DeleteCommentQuery>,
) -> ApiResult<Json<DeleteCommentOutcome>> {
    let service = CommentService::new(state.service_context());
    let outcome = service
        .delete_comment(&auth, comment_id, query.confirm)
        .await?;
    Ok(Json(outcome))
}

/// Direct replies, oldest first
///
/// GET /comments/{comment_id}/replies
pub async fn get_replies(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath,
) -> ApiResult<Json<Vec<CommentView>>> {
    let service = CommentService::new(state.service_context());
    Ok(Json(service.get_replies(comment_id).await?))
}
