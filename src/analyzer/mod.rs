// src/analyzer/mod.rs
//! LLM-backed analysis of LinkedIn posts.

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::error::{ApiError, ApiResult};

pub const INVALID_RESPONSE_MESSAGE: &str = "AI returned an invalid response. Please try again.";

/// Produces the loosely typed analysis and growth plan documents
#[async_trait]
pub trait ProfileAnalyzer: Send + Sync {
    async fn analyze_profile(&self, posts: &str) -> ApiResult<Value>;

    async fn generate_growth_plan(&self, analysis: &Value, posts: &str) -> ApiResult<Value>;
}

/// Parse a model reply, tolerating a surrounding markdown code fence
pub fn parse_json_response(text: &str) -> ApiResult<Value> {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }

    serde_json::from_str(cleaned.trim()).map_err(|e| {
        let preview: String = text.chars().take(500).collect();
        error!(error = %e, raw_response = %preview, "Failed to parse model JSON response");
        ApiError::upstream(INVALID_RESPONSE_MESSAGE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_json_response(r#"  {"detected_niche": "Fintech"} "#).unwrap();
        assert_eq!(value, json!({"detected_niche": "Fintech"}));
    }

    #[test]
    fn test_json_fence_is_stripped() {
        let text = "```json\n{\"plan_title\": \"Week\", \"days\": []}\n```";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value["plan_title"], "Week");
    }

    #[test]
    fn test_bare_fence_is_stripped() {
        let value = parse_json_response("```\n[1, 2]\n```").unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_invalid_json_is_upstream_error() {
        let err = parse_json_response("Sure! Here is your analysis:").unwrap_err();
        assert_eq!(err.status(), Status::BadGateway);
        assert_eq!(err.client_message(), INVALID_RESPONSE_MESSAGE);
    }
}
