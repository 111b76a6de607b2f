// src/database/users.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::auth::linkedin::LinkedInProfile;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub linkedin_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the user behind a LinkedIn identity
    pub async fn upsert_from_linkedin(
        &self,
        profile: &LinkedInProfile,
        access_token: &str,
    ) -> Result<User> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, linkedin_id, name, email, avatar_url, access_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(linkedin_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar_url = excluded.avatar_url,
                access_token = excluded.access_token,
                updated_at = excluded.updated_at
            RETURNING id, linkedin_id, name, email, avatar_url, access_token, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&profile.linkedin_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .bind(access_token)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .context("Failed to upsert user")?;

        info!(user_id = %user.id, "Upserted LinkedIn user");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, linkedin_id, name, email, avatar_url, access_token, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load user")?;

        Ok(user)
    }
}
