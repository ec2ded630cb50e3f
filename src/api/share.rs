/// Share endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    error::{ShareError, ShareResult},
    model::{DocumentRef, QueuedDeletion, ShareToken, Team},
    sharing::PendingShare,
};
use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build share routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/teams/share", post(share_teams))
        .route("/api/templates/share", post(share_template))
}

fn default_wait() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTeamsRequest {
    pub teams: Vec<Team>,
    /// Wait for the batch to be durable before answering
    #[serde(default = "default_wait")]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTemplateRequest {
    pub template_id: String,
    #[serde(default = "default_wait")]
    pub wait: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub token: ShareToken,
    pub link: String,
    pub timestamp: DateTime<Utc>,
    /// False when the batch was left committing in the background
    pub committed: bool,
}

/// Either wait for the share batch or leave it running
async fn finish(pending: PendingShare, wait: bool) -> ShareResult<(ShareToken, DateTime<Utc>)> {
    let timestamp = pending.timestamp();
    let token = if wait {
        pending.wait().await?
    } else {
        pending.token().clone()
    };
    Ok((token, timestamp))
}

/// Share a set of teams
async fn share_teams(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ShareTeamsRequest>,
) -> ShareResult<Json<ShareResponse>> {
    if req.teams.is_empty() {
        return Err(ShareError::Validation("No teams to share".to_string()));
    }

    let refs: Vec<DocumentRef> = req.teams.iter().map(Team::reference).collect();
    let pending = ctx
        .sharing
        .share(&auth.uid, &refs, QueuedDeletion::team_share_token)?;
    let (token, timestamp) = finish(pending, req.wait).await?;

    tracing::info!("User {} shared {} teams", auth.uid, refs.len());

    Ok(Json(ShareResponse {
        link: ctx.links.teams_link(&req.teams, Some(token.as_str())),
        token,
        timestamp,
        committed: req.wait,
    }))
}

/// Share a single template
async fn share_template(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ShareTemplateRequest>,
) -> ShareResult<Json<ShareResponse>> {
    if req.template_id.trim().is_empty() {
        return Err(ShareError::Validation("Template id is required".to_string()));
    }

    let refs = [DocumentRef::template(&req.template_id)];
    let pending = ctx
        .sharing
        .share(&auth.uid, &refs, QueuedDeletion::template_share_token)?;
    let (token, timestamp) = finish(pending, req.wait).await?;

    tracing::info!("User {} shared template {}", auth.uid, req.template_id);

    Ok(Json(ShareResponse {
        link: ctx.links.template_link(&req.template_id, Some(token.as_str())),
        token,
        timestamp,
        committed: req.wait,
    }))
}
