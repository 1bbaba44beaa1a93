//! SQLite session storage implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doctrips_core::auth::{AuthError, Result, Session, SessionId, SessionRepository};
use sqlx::SqlitePool;
use uuid::Uuid;

fn storage<E: std::fmt::Display>(e: E) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(storage)?
        .with_timezone(&Utc))
}

/// SQLite-backed session storage.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let url = format!("sqlite://{path}?mode=rwc");
        let pool = SqlitePool::connect(&url).await.map_err(storage)?;
        Ok(Self::new(pool))
    }

    /// Runs database migrations to create required tables.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                netid TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, netid, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.as_str())
        .bind(session.user_id.to_string())
        .bind(&session.netid)
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT id, user_id, netid, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match row {
            Some((id, user_id, netid, created_at, expires_at)) => Ok(Some(Session {
                id: SessionId::new(id),
                user_id: Uuid::parse_str(&user_id).map_err(storage)?,
                netid,
                created_at: parse_time(&created_at)?,
                expires_at: parse_time(&expires_at)?,
            })),
            None => Ok(None),
        }
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(())
    }
}
