//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{CommentRepository, Mailer, PostRepository, UserRepository};
use blog_infra::{LogMailer, MemoryStore, WebhookMailer};

#[cfg(feature = "postgres")]
use blog_infra::{
    DatabasePool, PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
    #[cfg(feature = "postgres")]
    pub db: Option<DatabasePool>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: AppConfig) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mail.webhook_url {
            Some(url) => {
                tracing::info!("Mail webhook configured");
                Arc::new(WebhookMailer::new(url.clone()))
            }
            None => {
                tracing::info!("MAIL_WEBHOOK_URL not set - share mails are written to the log");
                Arc::new(LogMailer)
            }
        };

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match DatabasePool::connect(db_config).await {
                    Ok(pool) => {
                        let state = Self::postgres(config.clone(), pool, mailer.clone());
                        tracing::info!(storage = "postgres", "Application state initialized");
                        return state;
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        let store = MemoryStore::new(config.search_language);
        tracing::info!(storage = "memory", "Application state initialized");
        Self::in_memory(config, store, mailer)
    }

    #[cfg(feature = "postgres")]
    fn postgres(config: AppConfig, pool: DatabasePool, mailer: Arc<dyn Mailer>) -> Self {
        let conn = pool.conn.clone();
        Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(
                conn.clone(),
                config.search_language,
            )),
            comments: Arc::new(PostgresCommentRepository::new(conn)),
            mailer,
            config: Arc::new(config),
            db: Some(pool),
        }
    }

    /// State backed by one in-memory store.
    pub fn in_memory(config: AppConfig, store: MemoryStore, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            mailer,
            config: Arc::new(config),
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Name of the active storage backend.
    pub fn storage(&self) -> &'static str {
        #[cfg(feature = "postgres")]
        {
            if self.db.is_some() {
                return "postgres";
            }
        }
        "memory"
    }

    /// Whether the storage backend answers.
    pub async fn storage_healthy(&self) -> bool {
        #[cfg(feature = "postgres")]
        {
            if let Some(pool) = &self.db {
                return pool.is_healthy().await;
            }
        }
        true
    }
}
