// src/database/analyses.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// A stored analysis. The analysis and plan are kept verbatim as JSON text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: String,
    pub user_id: String,
    pub raw_posts: String,
    pub detected_niche: Option<String>,
    pub growth_score: i64,
    pub full_analysis_json: String,
    pub growth_plan_json: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: String,
    pub detected_niche: Option<String>,
    pub growth_score: i64,
    pub created_at: DateTime<Utc>,
}

pub struct NewAnalysis<'a> {
    pub user_id: &'a str,
    pub raw_posts: &'a str,
    pub detected_niche: Option<&'a str>,
    pub growth_score: u8,
    pub full_analysis: &'a Value,
    pub growth_plan: &'a Value,
}

pub struct AnalysisRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AnalysisRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewAnalysis<'_>) -> Result<AnalysisRow> {
        let row = AnalysisRow {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.to_string(),
            raw_posts: new.raw_posts.to_string(),
            detected_niche: new.detected_niche.map(str::to_string),
            growth_score: i64::from(new.growth_score),
            full_analysis_json: serde_json::to_string(new.full_analysis)?,
            growth_plan_json: serde_json::to_string(new.growth_plan)?,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO analyses
                (id, user_id, raw_posts, detected_niche, growth_score, full_analysis_json, growth_plan_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.raw_posts)
        .bind(&row.detected_niche)
        .bind(row.growth_score)
        .bind(&row.full_analysis_json)
        .bind(&row.growth_plan_json)
        .bind(row.created_at)
        .execute(self.pool)
        .await
        .context("Failed to save analysis")?;

        info!(analysis_id = %row.id, user_id = %row.user_id, "Saved analysis");
        Ok(row)
    }

    /// Summaries of a user's analyses, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<AnalysisSummary>> {
        let analyses = sqlx::query_as::<_, AnalysisSummary>(
            r#"
            SELECT id, detected_niche, growth_score, created_at
            FROM analyses
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .context("Failed to list analyses")?;

        Ok(analyses)
    }

    pub async fn find_for_user(&self, id: &str, user_id: &str) -> Result<Option<AnalysisRow>> {
        let analysis = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT id, user_id, raw_posts, detected_niche, growth_score,
                   full_analysis_json, growth_plan_json, created_at
            FROM analyses
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load analysis")?;

        Ok(analysis)
    }

    /// Returns false when no analysis with that id belongs to the user
    pub async fn delete_for_user(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .context("Failed to delete analysis")?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(analysis_id = %id, "Deleted analysis");
        }

        Ok(deleted)
    }
}
