// src/web/types.rs
use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::analyzer::ProfileAnalyzer;
use crate::auth::IdentityProvider;
use crate::database::{AnalysisSummary, User};
use crate::growth_score::ScoreBreakdown;

/// Settings the handlers need at request time
pub struct ServerConfig {
    pub client_url: String,
}

impl ServerConfig {
    /// Frontend login page carrying an OAuth error code
    pub fn login_error_url(&self, code: &str) -> String {
        format!("{}/login?error={}", self.client_url.trim_end_matches('/'), code)
    }

    pub fn auth_callback_url(&self, token: &str) -> String {
        format!(
            "{}/auth/callback?token={}",
            self.client_url.trim_end_matches('/'),
            token
        )
    }
}

/// External collaborators, built once at startup
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub analyzer: Arc<dyn ProfileAnalyzer>,
}

/// Envelope for every successful API response
#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UserData {
    pub user: User,
}

/// `posts` stays untyped so a missing or non-string value gets the friendly 400
#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub posts: Value,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AnalyzeData {
    pub analysis_id: String,
    pub analysis: Value,
    pub growth_score: ScoreBreakdown,
    pub growth_plan: Value,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalysisListData {
    pub analyses: Vec<AnalysisSummary>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AnalysisDetail {
    pub id: String,
    pub raw_posts: String,
    pub detected_niche: Option<String>,
    pub growth_score: ScoreBreakdown,
    pub full_analysis: Value,
    pub growth_plan: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalysisDetailData {
    pub analysis: AnalysisDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = serde_json::to_value(ApiResponse::ok(1, "done")).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 1, "message": "done"}));

        let empty = serde_json::to_value(ApiResponse::<()>::empty("bye")).unwrap();
        assert_eq!(empty["data"], Value::Null);

        let err = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"success": false, "data": null, "message": "nope"})
        );
    }

    #[test]
    fn test_redirect_urls() {
        let config = ServerConfig {
            client_url: "http://localhost:5173/".to_string(),
        };
        assert_eq!(
            config.login_error_url("no_code"),
            "http://localhost:5173/login?error=no_code"
        );
        assert_eq!(
            config.auth_callback_url("abc.def"),
            "http://localhost:5173/auth/callback?token=abc.def"
        );
    }
}
