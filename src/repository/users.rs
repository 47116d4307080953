//! Persistence operations for user accounts: key lookups and single-field
//! updates, each committing independently.

use sqlx::PgPool;

use crate::db::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, confirmed, avatar, refresh_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// New accounts start unconfirmed with the default `user` role.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        avatar: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, confirmed, avatar, refresh_token, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(avatar)
        .fetch_one(&self.pool)
        .await
    }

    /// Rotate the stored refresh token; `None` revokes it. This is the
    /// only server-side invalidation path for issued tokens.
    pub async fn update_refresh_token(
        &self,
        user_id: i64,
        token: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn confirm_email(&self, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET confirmed = true WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
