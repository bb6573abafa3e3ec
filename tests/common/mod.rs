//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use sql_mcp_gateway::config::PoolOptions;
use sql_mcp_gateway::db::{DbPool, PoolRegistry};
use sql_mcp_gateway::mcp::GatewayService;
use sql_mcp_gateway::models::ConnectionString;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::Arc;
use tempfile::TempDir;

pub const SEED: &str = r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        total REAL NOT NULL,
        note BLOB
    );
    CREATE VIEW active_users AS SELECT id, email FROM users WHERE active = 1;

    INSERT INTO users (id, email, name, active) VALUES
        (1, 'ada@example.com', 'Ada', 1),
        (2, 'bob@example.com', NULL, 0);
    INSERT INTO orders (id, user_id, total, note) VALUES
        (1, 1, 9.5, X'68656C6C6F'),
        (2, 1, 20.25, X'FF00');
"#;

/// A seeded SQLite file that lives as long as this value.
pub struct TestDb {
    _dir: TempDir,
    pub url: String,
}

impl TestDb {
    pub fn connection_string(&self) -> ConnectionString {
        ConnectionString::parse(self.url.clone()).unwrap()
    }
}

/// Create and seed a database through a separate writable pool.
pub async fn seeded_sqlite() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let writer = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::raw_sql(SEED).execute(&writer).await.unwrap();
    writer.close().await;

    TestDb {
        url: format!("sqlite://{}", path.display()),
        _dir: dir,
    }
}

/// Registry, default pool and service over `db`.
pub async fn gateway(
    db: &TestDb,
    options: PoolOptions,
) -> (Arc<PoolRegistry>, Arc<DbPool>, GatewayService) {
    let conn = db.connection_string();
    let registry = Arc::new(PoolRegistry::new(options));
    let pool = registry.get_pool(&conn).await.unwrap();
    let service = GatewayService::new(Arc::clone(&pool), conn.resource_base().unwrap());
    (registry, pool, service)
}

/// Wait until every open connection is back in the pool.
pub async fn wait_until_idle(pool: &DbPool) {
    for _ in 0..100 {
        if pool.num_idle() == pool.size() as usize {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!(
        "connections not released: size={}, idle={}",
        pool.size(),
        pool.num_idle()
    );
}
