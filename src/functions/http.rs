/// HTTP callable-function client
use crate::{
    config::FunctionsConfig,
    error::{ShareError, ShareResult},
    functions::{FunctionsClient, FunctionsError, FunctionsErrorCode},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Posts `{"data": payload}` to `<base_url>/<name>`
#[derive(Clone)]
pub struct HttpFunctionsClient {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Error body of a failed call
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: RemoteError,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

impl HttpFunctionsClient {
    /// Create a new functions client
    pub fn new(config: &FunctionsConfig) -> ShareResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShareError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

/// Turn a raw response into the function result or a typed failure
fn decode_response(status: reqwest::StatusCode, body: &str) -> Result<Value, FunctionsError> {
    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(body) {
        return Err(FunctionsError::Remote {
            code: FunctionsErrorCode::parse(&error.status),
            message: error.message,
            details: error.details,
        });
    }

    if !status.is_success() {
        return Err(FunctionsError::Remote {
            code: FunctionsErrorCode::Internal,
            message: format!("Unexpected HTTP status {}", status),
            details: None,
        });
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| FunctionsError::Transport(format!("Invalid response body: {}", e)))?;

    // Older backends answer with `data` instead of `result`
    value
        .get("result")
        .or_else(|| value.get("data"))
        .cloned()
        .ok_or_else(|| FunctionsError::Transport("Response has no result".to_string()))
}

#[async_trait]
impl FunctionsClient for HttpFunctionsClient {
    async fn call(&self, name: &str, payload: Value) -> Result<Value, FunctionsError> {
        let url = self.function_url(name);
        debug!("Calling function {}", url);

        let mut request = self.http_client.post(&url).json(&json!({ "data": payload }));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FunctionsError::Transport(format!("Failed to call {}: {}", name, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FunctionsError::Transport(format!("Failed to read {} response: {}", name, e)))?;

        decode_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};

    #[test]
    fn test_decode_result() {
        let value = decode_response(reqwest::StatusCode::OK, r#"{"result": {"ok": true}}"#).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_decode_typed_error() {
        let body = r#"{"error": {"status": "PERMISSION_DENIED", "message": "bad token", "details": {"ref": "teams/a"}}}"#;
        let err = decode_response(reqwest::StatusCode::FORBIDDEN, body).unwrap_err();

        match err {
            FunctionsError::Remote {
                code,
                message,
                details,
            } => {
                assert_eq!(code, FunctionsErrorCode::PermissionDenied);
                assert_eq!(message, "bad token");
                assert_eq!(details, Some(json!({"ref": "teams/a"})));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_untyped_http_failure() {
        let err = decode_response(reqwest::StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(matches!(
            err,
            FunctionsError::Remote {
                code: FunctionsErrorCode::Internal,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_garbage_success_body() {
        let err = decode_response(reqwest::StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, FunctionsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_call_posts_wrapped_payload() {
        async fn echo(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            (StatusCode::OK, Json(json!({ "result": body["data"].clone() })))
        }

        let app = Router::new().route("/updateOwners", post(echo));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = HttpFunctionsClient::new(&FunctionsConfig {
            base_url: format!("http://{}/", addr),
            auth_token: Some("secret".to_string()),
            timeout_secs: 5,
        })
        .unwrap();

        let result = client
            .call("updateOwners", json!({"token": "abc"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"token": "abc"}));
    }
}
