//! Reaction handlers
//!
//! Endpoints for project reactions.

use axum::{extract::State, Json};
use folio_service::dto::{
    ReactionSummaryView, ReactorView, ReactorsQuery, ToggleReactionRequest, ToggleView,
};
use folio_service::ReactionService;

use crate::extractors::{Caller, IdPath, ValidatedJson, ValidatedQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// Toggle the caller's reaction
///
/// POST /projects/{project_id}/reactions
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(project_id): IdPath,
    ValidatedJson(request): ValidatedJson<ToggleReactionRequest>,
) -> ApiResult<Json<ToggleView>> {
    let service = ReactionService::new(state.service_context());
    let view = service
        .toggle(&auth, project_id, &request.reaction_type)
        .await?;
    Ok(Json(view))
}

/// Reaction counters, with the caller's own reaction when signed in
///
/// GET /projects/{project_id}/reactions
pub async fn get_reaction_summary(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(project_id): IdPath,
) -> ApiResult<Json<ReactionSummaryView>> {
    let service = ReactionService::new(state.service_context());
    Ok(Json(service.summary(project_id, &auth).await?))
}

/// Users who reacted, oldest first
///
/// GET /projects/{project_id}/reactions/users?type=&limit=
pub async fn get_reactors(
    State(state): State<AppState>,
    IdPath(project_id): IdPath,
    ValidatedQuery(query): ValidatedQuery<ReactorsQuery>,
) -> ApiResult<Json<Vec<ReactorView>>> {
    let service = ReactionService::new(state.service_context());
    let reactors = service
        .reactors(project_id, query.reaction_type.as_deref(), query.limit())
        .await?;
    Ok(Json(reactors))
}

/// Rebuild counters from the ledger (admins)
///
/// POST /projects/{project_id}/reactions/reconcile
pub async fn reconcile_reactions(
    State(state): State<AppState>,
    Caller(auth): Caller,
    IdPath(project_id): IdPath,
) -> ApiResult<Json<ReactionSummaryView>> {
    let service = ReactionService::new(state.service_context());
    Ok(Json(service.reconcile(&auth, project_id).await?))
}
