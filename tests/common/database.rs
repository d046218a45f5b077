//! In-memory database fixture

use sqlx::SqlitePool;
use stride::backend::server::config::{memory_pool, run_migrations};

/// A migrated private in-memory SQLite database
pub struct TestDatabase {
    pool: SqlitePool,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let pool = memory_pool().await.expect("Failed to open in-memory database");
        run_migrations(&pool).await.expect("Failed to run migrations");
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn into_pool(self) -> SqlitePool {
        self.pool
    }
}
