/// Token-based sharing
///
/// Shares records by stamping a freshly generated token into each
/// record's `activeTokens` map, and lets a recipient holding that token
/// claim the records through the trusted `updateOwners` function.

use crate::{
    error::{ShareError, ShareResult},
    functions::{FunctionsClient, FunctionsError, UPDATE_OWNERS},
    model::{
        DocumentRef, FieldPath, OwnerUpdateRequest, OwnerValue, QueuedDeletion, ShareToken,
        FIELD_ACTIVE_TOKENS, FIELD_OWNERS,
    },
    store::{DocumentStore, WriteBatch},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// Share and ownership-transfer service
#[derive(Clone)]
pub struct ShareService {
    store: Arc<dyn DocumentStore>,
    functions: Arc<dyn FunctionsClient>,
}

/// A share whose batch may still be in flight
///
/// The token is usable as soon as this is returned. Dropping it leaves
/// the commit running in the background.
#[derive(Debug)]
pub struct PendingShare {
    token: ShareToken,
    timestamp: DateTime<Utc>,
    handle: JoinHandle<ShareResult<()>>,
}

impl PendingShare {
    pub fn token(&self) -> &ShareToken {
        &self.token
    }

    /// Timestamp written next to the token on every record
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Wait for the batch to be durable
    pub async fn wait(self) -> ShareResult<ShareToken> {
        match self.handle.await {
            Ok(Ok(())) => Ok(self.token),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(ShareError::Internal(format!(
                "Share commit task for token {} failed: {}",
                self.token, e
            ))),
        }
    }
}

/// Result of one record's ownership update
#[derive(Debug, Clone)]
pub struct OwnerUpdateOutcome {
    pub reference: DocumentRef,
    pub result: Result<Value, FunctionsError>,
}

impl OwnerUpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl ShareService {
    pub fn new(store: Arc<dyn DocumentStore>, functions: Arc<dyn FunctionsClient>) -> Self {
        Self { store, functions }
    }

    /// Share `records` on behalf of `owner_uid`
    ///
    /// Every record gets `activeTokens.<token> = now` and the entry built by
    /// `deletion` is merged into the owner's deletion queue, all in one
    /// atomic batch. The batch only applies if `owner_uid` is listed in
    /// every record's `owners` map; otherwise it fails with
    /// `ShareError::Authorization` and nothing is written.
    ///
    /// The batch is committed on a task spawned onto the current tokio
    /// runtime. Called outside a runtime this returns `ShareError::Internal`.
    pub fn share<F>(
        &self,
        owner_uid: &str,
        records: &[DocumentRef],
        deletion: F,
    ) -> ShareResult<PendingShare>
    where
        F: FnOnce(&ShareToken, &[String]) -> QueuedDeletion,
    {
        if records.is_empty() {
            return Err(ShareError::Validation(
                "At least one record is required to share".to_string(),
            ));
        }

        let runtime = Handle::try_current().map_err(|e| {
            ShareError::Internal(format!("Sharing requires a tokio runtime: {}", e))
        })?;

        let token = ShareToken::new(self.store.generate_id());
        let timestamp = Utc::now();
        let token_path = FieldPath::of([FIELD_ACTIVE_TOKENS, token.as_str()]);
        let owner_path = FieldPath::of([FIELD_OWNERS, owner_uid]);
        let stamp = Value::String(timestamp.to_rfc3339());

        let mut batch = WriteBatch::new();
        for record in records {
            batch
                .require(record.clone(), owner_path.clone())
                .update(record.clone(), token_path.clone(), stamp.clone());
        }
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        batch.set_merge(
            DocumentRef::deletion_queue(owner_uid),
            deletion(&token, ids.as_slice()).at(timestamp).data(),
        );

        debug!("Sharing {} records with token {}", records.len(), token);

        let store = Arc::clone(&self.store);
        let task_token = token.clone();
        let refs: Vec<String> = records.iter().map(DocumentRef::path).collect();
        let handle = runtime.spawn(async move {
            let result = store.commit(batch).await;
            if let Err(e) = &result {
                error!(
                    "Failed to share {:?} with token {}: {}",
                    refs, task_token, e
                );
            }
            result
        });

        Ok(PendingShare {
            token,
            timestamp,
            handle,
        })
    }

    /// Share and wait until the batch is durable
    pub async fn share_and_wait<F>(
        &self,
        owner_uid: &str,
        records: &[DocumentRef],
        deletion: F,
    ) -> ShareResult<ShareToken>
    where
        F: FnOnce(&ShareToken, &[String]) -> QueuedDeletion,
    {
        self.share(owner_uid, records, deletion)?.wait().await
    }

    /// Claim `records` through the trusted `updateOwners` function
    ///
    /// One call per record, all in flight at once. A failing record never
    /// stops the others; outcomes come back in input order.
    pub async fn update_owner<F>(
        &self,
        records: &[DocumentRef],
        token: &ShareToken,
        prev_uid: Option<&str>,
        new_value: F,
    ) -> Vec<OwnerUpdateOutcome>
    where
        F: Fn(&DocumentRef) -> OwnerValue,
    {
        let calls = records.iter().map(|reference| {
            let request = OwnerUpdateRequest {
                token: token.clone(),
                reference: reference.path(),
                prev_uid: prev_uid.map(str::to_string),
                value: new_value(reference),
            };

            async move {
                let result = match serde_json::to_value(&request) {
                    Ok(payload) => self.functions.call(UPDATE_OWNERS, payload).await,
                    Err(e) => Err(FunctionsError::Transport(format!(
                        "Failed to encode request: {}",
                        e
                    ))),
                };

                if let Err(e) = &result {
                    if let FunctionsError::Remote { code, details, .. } = e {
                        error!("Functions failed ({}) with details: {:?}", code, details);
                    }
                    warn!(
                        "Failed to update owner of {}: {} (Token: {}, from user: {})",
                        reference,
                        e,
                        token,
                        prev_uid.unwrap_or("null")
                    );
                }

                OwnerUpdateOutcome {
                    reference: reference.clone(),
                    result,
                }
            }
        });

        let outcomes = join_all(calls).await;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            info!(
                "Owner update with token {}: {} of {} records failed",
                token,
                failed,
                outcomes.len()
            );
        } else {
            info!("Owner update with token {}: {} records updated", token, outcomes.len());
        }

        outcomes
    }
}
