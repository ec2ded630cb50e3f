/// Ownership claim endpoint
use crate::{
    auth::AuthContext,
    context::AppContext,
    error::{ShareError, ShareResult},
    functions::FunctionsError,
    model::{DocumentRef, OwnerValue, ShareToken},
    sharing::OwnerUpdateOutcome,
};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Build ownership routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/owners/update", post(update_owners))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOwnersRequest {
    /// Record paths, e.g. `teams/abc123`
    pub refs: Vec<String>,
    pub token: ShareToken,
    #[serde(default)]
    pub prev_uid: Option<String>,
    /// `{"number": n}` or `{"timestamp": millis}`
    pub value: OwnerValue,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeView {
    #[serde(rename = "ref")]
    pub reference: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<OwnerUpdateOutcome> for OutcomeView {
    fn from(outcome: OwnerUpdateOutcome) -> Self {
        let reference = outcome.reference.path();
        match outcome.result {
            Ok(result) => OutcomeView {
                reference,
                success: true,
                result: Some(result),
                code: None,
                error: None,
            },
            Err(e) => OutcomeView {
                reference,
                success: false,
                result: None,
                code: match &e {
                    FunctionsError::Remote { code, .. } => Some(code.to_string()),
                    FunctionsError::Transport(_) => None,
                },
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOwnersResponse {
    pub outcomes: Vec<OutcomeView>,
}

/// Claim shared records with a share token
async fn update_owners(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<UpdateOwnersRequest>,
) -> ShareResult<Json<UpdateOwnersResponse>> {
    let refs = req
        .refs
        .iter()
        .map(|path| {
            DocumentRef::parse(path)
                .ok_or_else(|| ShareError::Validation(format!("Invalid record path: {}", path)))
        })
        .collect::<ShareResult<Vec<_>>>()?;

    tracing::info!(
        "User {} claiming {} records with token {}",
        auth.uid,
        refs.len(),
        req.token
    );

    let value = req.value;
    let outcomes = ctx
        .sharing
        .update_owner(&refs, &req.token, req.prev_uid.as_deref(), |_| value)
        .await;

    Ok(Json(UpdateOwnersResponse {
        outcomes: outcomes.into_iter().map(OutcomeView::from).collect(),
    }))
}
