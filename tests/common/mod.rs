use std::sync::Arc;

use atelier_api::{
    config::AppConfig,
    db, events,
    services::items::CreateItemInput,
    AppState,
};

/// Test harness backed by a fresh in-memory SQLite database.
///
/// The pool is pinned to a single connection: an in-memory SQLite database
/// lives and dies with its connection.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
            ..AppConfig::default()
        };

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        Self {
            state,
            _event_task: event_task,
        }
    }

    /// Creates a catalog item with sensible defaults, returning its id.
    #[allow(dead_code)]
    pub async fn seed_item(&self, code: &str, name: &str) -> i32 {
        let item = self
            .state
            .items
            .create(CreateItemInput {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                unit: None,
                category: None,
                stock_min: None,
                active: None,
            })
            .await
            .expect("failed to seed item");
        item.id
    }
}
