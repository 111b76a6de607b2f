// src/analyzer/gemini.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use super::{parse_json_response, prompts, ProfileAnalyzer};
use crate::config::GeminiConfig;
use crate::error::{ApiError, ApiResult};

const ANALYSIS_FAILED: &str = "AI analysis failed. Please try again.";
const PLAN_FAILED: &str = "Growth plan generation failed. Please try again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
    }
}

/// Google Generative Language API client
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    pub async fn send_completion(&self, context: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        info!(model = %self.config.model, "Sending request to Gemini: {}", context);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned error {}: {}", status, error_text);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        body.first_text()
            .context("Gemini response contained no text candidate")
    }

    async fn generate_json(&self, context: &str, prompt: &str, failure: &str) -> ApiResult<Value> {
        let text = self.send_completion(context, prompt).await.map_err(|e| {
            error!("Gemini {} failed: {:#}", context, e);
            ApiError::upstream(failure)
        })?;

        parse_json_response(&text)
    }
}

#[async_trait]
impl ProfileAnalyzer for GeminiClient {
    async fn analyze_profile(&self, posts: &str) -> ApiResult<Value> {
        let prompt = prompts::profile_analysis(posts);
        self.generate_json("profile analysis", &prompt, ANALYSIS_FAILED)
            .await
    }

    async fn generate_growth_plan(&self, analysis: &Value, posts: &str) -> ApiResult<Value> {
        let prompt = prompts::growth_plan(analysis, posts);
        self.generate_json("growth plan generation", &prompt, PLAN_FAILED)
            .await
    }
}
