/// End-to-end tests for the share API
///
/// Each test runs the router on a local port against an in-memory
/// document store and a fake `updateOwners` backend.
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use scouter_share::{
    config::{
        AuthConfig, FunctionsConfig, LoggingConfig, ServerConfig, ServiceConfig, StorageConfig,
        DEFAULT_APP_LINK_BASE,
    },
    context::AppContext,
    db,
    functions::{FunctionsClient, FunctionsError, FunctionsErrorCode},
    model::DocumentRef,
    server,
    store::{DocumentStore, SqliteDocumentStore},
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const SECRET: &str = "test-secret-test-secret-test-secret";

/// Rejects `teams/locked`, accepts everything else
#[derive(Default)]
struct FakeFunctions {
    calls: Mutex<Vec<Value>>,
}

#[async_trait]
impl FunctionsClient for FakeFunctions {
    async fn call(&self, _name: &str, payload: Value) -> Result<Value, FunctionsError> {
        self.calls.lock().unwrap().push(payload.clone());
        if payload["ref"] == "teams/locked" {
            return Err(FunctionsError::Remote {
                code: FunctionsErrorCode::PermissionDenied,
                message: "Token is not active".to_string(),
                details: None,
            });
        }
        Ok(json!({"ok": true}))
    }
}

fn config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            app_link_base: DEFAULT_APP_LINK_BASE.to_string(),
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            document_db: PathBuf::from("./data/documents.sqlite"),
        },
        functions: FunctionsConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            auth_token: None,
            timeout_secs: 5,
        },
        authentication: AuthConfig {
            jwt_secret: SECRET.to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

fn bearer(uid: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = encode(
        &Header::default(),
        &json!({"sub": uid, "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

fn owned_team(number: i64, uid: &str) -> Value {
    json!({"number": number, "owners": { uid: number }})
}

struct TestServer {
    url: String,
    store: SqliteDocumentStore,
    functions: Arc<FakeFunctions>,
}

async fn start() -> TestServer {
    let pool = db::create_memory_pool().await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let store = SqliteDocumentStore::new(pool.clone());
    let functions = Arc::new(FakeFunctions::default());

    let ctx = AppContext::with_backends(config(), pool, functions.clone());
    let app = server::build_router(ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        url: format!("http://{}", addr),
        store,
        functions,
    }
}

#[tokio::test]
async fn test_health() {
    let server = start().await;
    let body: Value = reqwest::get(format!("{}/health", server.url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_share_requires_authentication() {
    let server = start().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/teams/share", server.url))
        .json(&json!({"teams": [{"id": "a", "number": 254}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_share_teams_stamps_records_and_queue() {
    let server = start().await;
    for (id, number) in [("a", 254), ("b", 1678)] {
        server
            .store
            .put(&DocumentRef::team(id), &owned_team(number, "owner-1"))
            .await
            .unwrap();
    }

    let response = reqwest::Client::new()
        .post(format!("{}/api/teams/share", server.url))
        .header("Authorization", bearer("owner-1"))
        .json(&json!({"teams": [{"id": "a", "number": 254}, {"id": "b", "number": 1678}]}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    let link = body["link"].as_str().unwrap();
    assert!(link.contains(&format!("activeTokens={}", token)));
    assert!(link.ends_with("a=254&b=1678&keys=a,b"));
    assert_eq!(body["committed"], true);

    let a = server.store.get(&DocumentRef::team("a")).await.unwrap().unwrap();
    let b = server.store.get(&DocumentRef::team("b")).await.unwrap().unwrap();
    assert!(a["activeTokens"][&token].is_string());
    assert_eq!(a["activeTokens"][&token], b["activeTokens"][&token]);

    let queue = server
        .store
        .get(&DocumentRef::deletion_queue("owner-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(queue[&token]["ids"], json!({"a": true, "b": true}));
}

#[tokio::test]
async fn test_share_missing_team_fails_atomically() {
    let server = start().await;
    server
        .store
        .put(&DocumentRef::team("a"), &owned_team(254, "owner-1"))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/teams/share", server.url))
        .header("Authorization", bearer("owner-1"))
        .json(&json!({"teams": [{"id": "a", "number": 254}, {"id": "ghost", "number": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let a = server.store.get(&DocumentRef::team("a")).await.unwrap().unwrap();
    assert!(a.get("activeTokens").is_none());
    assert!(server
        .store
        .get(&DocumentRef::deletion_queue("owner-1"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_share_someone_elses_team_is_forbidden() {
    let server = start().await;
    server
        .store
        .put(&DocumentRef::team("a"), &owned_team(254, "owner-1"))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/teams/share", server.url))
        .header("Authorization", bearer("someone-else"))
        .json(&json!({"teams": [{"id": "a", "number": 254}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    let a = server.store.get(&DocumentRef::team("a")).await.unwrap().unwrap();
    assert!(a.get("activeTokens").is_none());
    assert!(server
        .store
        .get(&DocumentRef::deletion_queue("someone-else"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_share_template_without_waiting() {
    let server = start().await;
    let template = DocumentRef::template("tmpl1");
    server
        .store
        .put(&template, &json!({"name": "Pit scouting", "owners": {"owner-1": 1}}))
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/api/templates/share", server.url))
        .header("Authorization", bearer("owner-1"))
        .json(&json!({"templateId": "tmpl1", "wait": false}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["committed"], false);
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    assert!(body["link"].as_str().unwrap().contains(&format!("activeTokens={}", token)));

    let mut stamped = false;
    for _ in 0..100 {
        let doc = server.store.get(&template).await.unwrap().unwrap();
        if doc["activeTokens"].get(&token).is_some() {
            stamped = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(stamped);
}

#[tokio::test]
async fn test_update_owners_reports_each_record() {
    let server = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/owners/update", server.url))
        .header("Authorization", bearer("recipient"))
        .json(&json!({
            "refs": ["teams/a", "teams/locked", "teams/c"],
            "token": "tok123",
            "prevUid": "owner-1",
            "value": {"number": 254}
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0]["success"], true);
    assert_eq!(outcomes[1]["success"], false);
    assert_eq!(outcomes[1]["code"], "PERMISSION_DENIED");
    assert_eq!(outcomes[2]["success"], true);

    let calls = server.functions.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|call| call["prevUid"] == "owner-1" && call["number"] == 254));
}

#[tokio::test]
async fn test_update_owners_rejects_bad_path() {
    let server = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/owners/update", server.url))
        .header("Authorization", bearer("recipient"))
        .json(&json!({"refs": ["nocollection"], "token": "t", "value": {"timestamp": 1000}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(server.functions.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_template_link_endpoint() {
    let server = start().await;

    let body: Value = reqwest::get(format!(
        "{}/api/templates/tmpl1/link?name=Pit%20scouting",
        server.url
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert!(body["link"].as_str().unwrap().ends_with("templates/?tmpl1=true&keys=tmpl1"));
    assert_eq!(body["action"]["name"], "Pit scouting");
    assert_eq!(body["indexable"]["worksOffline"], true);
    assert_eq!(body["indexable"]["scope"], "CROSS_DEVICE");
}
