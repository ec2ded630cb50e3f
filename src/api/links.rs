/// Link and indexable endpoints
use crate::{
    context::AppContext,
    error::{ShareError, ShareResult},
    links::{Indexable, ViewAction},
    model::Team,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build link routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/teams/link", post(teams_link))
        .route("/api/templates/:id/link", get(template_link))
}

#[derive(Debug, Deserialize)]
pub struct TeamsLinkRequest {
    pub teams: Vec<Team>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamsLinkResponse {
    pub link: String,
    pub actions: Vec<ViewAction>,
    pub indexables: Vec<Indexable>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateLinkQuery {
    pub name: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateLinkResponse {
    pub link: String,
    pub action: ViewAction,
    pub indexable: Indexable,
}

/// Link plus per-team actions and indexables
async fn teams_link(
    State(ctx): State<AppContext>,
    Json(req): Json<TeamsLinkRequest>,
) -> ShareResult<Json<TeamsLinkResponse>> {
    if req.teams.is_empty() {
        return Err(ShareError::Validation("No teams given".to_string()));
    }

    // Indexables stat media paths on disk
    let links = ctx.links.clone();
    let response = tokio::task::spawn_blocking(move || TeamsLinkResponse {
        link: links.teams_link(&req.teams, req.token.as_deref()),
        actions: req.teams.iter().map(|team| links.team_view_action(team)).collect(),
        indexables: req.teams.iter().map(|team| links.team_indexable(team)).collect(),
    })
    .await
    .map_err(|e| ShareError::Internal(format!("Link task failed: {}", e)))?;

    Ok(Json(response))
}

/// Link, action and indexable for a template
async fn template_link(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(query): Query<TemplateLinkQuery>,
) -> Json<TemplateLinkResponse> {
    let name = query.name.unwrap_or_else(|| id.clone());

    Json(TemplateLinkResponse {
        link: ctx.links.template_link(&id, query.token.as_deref()),
        action: ctx.links.template_view_action(&id, &name),
        indexable: ctx.links.template_indexable(&id, &name),
    })
}
