pub mod models;

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Build the connection pool. Pool sizes are env-tunable; each request
/// checks a connection out per query and returns it on every exit path.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections: u32 = std::env::var("DB_POOL_MAX")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let min_connections: u32 = std::env::var("DB_POOL_MIN")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    tracing::info!("Initializing database connection pool...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .idle_timeout(std::time::Duration::from_secs(300))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

/// Pool that performs no I/O until first use. Handler tests that never
/// reach the database go through this.
pub fn lazy_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new().connect_lazy(database_url).unwrap_or_else(|e| {
        panic!("invalid database url: {e}");
    })
}

pub async fn health_check(pool: &PgPool) -> Result<std::time::Duration, sqlx::Error> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(start.elapsed())
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            confirmed BOOLEAN NOT NULL DEFAULT false,
            avatar TEXT NOT NULL DEFAULT '',
            refresh_token TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            birthday TEXT NOT NULL,
            additional_data TEXT NOT NULL DEFAULT ''
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_contacts_user_id ON contacts(user_id);
        CREATE INDEX IF NOT EXISTS idx_contacts_first_name ON contacts(user_id, first_name);
        CREATE INDEX IF NOT EXISTS idx_contacts_last_name ON contacts(user_id, last_name);
        CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(user_id, email)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_pool_builds_without_server() {
        let _pool = lazy_pool("postgresql://localhost:5432/contacts_test");
    }

    #[tokio::test]
    async fn test_health_check_fails_without_server() {
        let pool = lazy_pool("postgresql://127.0.0.1:1/contacts_test");
        assert!(health_check(&pool).await.is_err());
    }
}
