// src/auth/linkedin.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::LinkedInConfig;
use crate::error::{ApiError, ApiResult};

const AUTHORIZATION_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const ACCESS_TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedInProfile {
    pub linkedin_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// OpenID Connect userinfo payload
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl From<UserInfo> for LinkedInProfile {
    fn from(info: UserInfo) -> Self {
        let name = match info.name.filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => format!(
                "{} {}",
                info.given_name.unwrap_or_default(),
                info.family_name.unwrap_or_default()
            )
            .trim()
            .to_string(),
        };

        Self {
            linkedin_id: info.sub,
            name,
            email: info.email,
            avatar_url: info.picture,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

/// The OAuth provider users sign in with
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent screen URL carrying the given CSRF state
    fn authorization_url(&self, state: &str) -> Result<String>;

    async fn exchange_code(&self, code: &str) -> ApiResult<String>;

    async fn fetch_profile(&self, access_token: &str) -> ApiResult<LinkedInProfile>;
}

pub struct LinkedInClient {
    client: Client,
    config: LinkedInConfig,
}

impl LinkedInClient {
    pub fn new(config: LinkedInConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl IdentityProvider for LinkedInClient {
    fn authorization_url(&self, state: &str) -> Result<String> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            AUTHORIZATION_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .context("Failed to build LinkedIn authorization URL")?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> ApiResult<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(ACCESS_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("LinkedIn token request failed: {}", e);
                ApiError::unauthorized("Failed to authenticate with LinkedIn.")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "LinkedIn token exchange failed");
            return Err(ApiError::unauthorized("Failed to authenticate with LinkedIn."));
        }

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            error!("LinkedIn token response unreadable: {}", e);
            ApiError::unauthorized("Failed to authenticate with LinkedIn.")
        })?;

        info!("Exchanged LinkedIn authorization code");
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> ApiResult<LinkedInProfile> {
        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!("LinkedIn profile request failed: {}", e);
                ApiError::upstream("Failed to fetch LinkedIn profile.")
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "LinkedIn profile fetch failed");
            return Err(ApiError::upstream("Failed to fetch LinkedIn profile."));
        }

        let info: UserInfo = response.json().await.map_err(|e| {
            error!("LinkedIn profile response unreadable: {}", e);
            ApiError::upstream("Failed to fetch LinkedIn profile.")
        })?;

        Ok(info.into())
    }
}
