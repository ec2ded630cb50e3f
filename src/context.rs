/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    error::{ShareError, ShareResult},
    functions::{FunctionsClient, HttpFunctionsClient},
    links::LinkBuilder,
    sharing::ShareService,
    store::{DocumentStore, SqliteDocumentStore},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub document_db: SqlitePool,
    pub documents: Arc<dyn DocumentStore>,
    pub sharing: Arc<ShareService>,
    pub links: Arc<LinkBuilder>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ShareResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize document database
        let document_db =
            db::create_pool(&config.storage.document_db, db::DatabaseOptions::default()).await?;
        db::run_migrations(&document_db).await?;
        db::test_connection(&document_db).await?;

        let functions: Arc<dyn FunctionsClient> =
            Arc::new(HttpFunctionsClient::new(&config.functions)?);
        tracing::info!("Remote functions at {}", config.functions.base_url);

        Ok(Self::with_backends(config, document_db, functions))
    }

    /// Assemble a context around an existing pool and functions client
    pub fn with_backends(
        config: ServerConfig,
        document_db: SqlitePool,
        functions: Arc<dyn FunctionsClient>,
    ) -> Self {
        let documents: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::new(document_db.clone()));
        let sharing = Arc::new(ShareService::new(Arc::clone(&documents), functions));
        let links = Arc::new(LinkBuilder::new(&config.service.app_link_base));

        Self {
            config: Arc::new(config),
            document_db,
            documents,
            sharing,
            links,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ShareResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                ShareError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
