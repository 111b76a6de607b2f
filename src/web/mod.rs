// src/web/mod.rs

pub mod handlers;
pub mod rate_limit;
pub mod types;

pub use rate_limit::{
    AnalysisQuota, ApiQuota, IpQuota, QuotaExceeded, QuotaFailure, WithinAnalysisQuota,
    WithinApiQuota,
};
pub use types::*;

use crate::analyzer::GeminiClient;
use crate::auth::{AuthFailure, AuthenticatedUser, LinkedInClient, TokenService};
use crate::config::AppConfig;
use crate::database::Database;
use crate::error::ApiResult;
use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{CookieJar, Header, Status};
use rocket::response::{status, Redirect};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use handlers::CallbackParams;

// CORS Fairing
pub struct Cors {
    allowed_origin: String,
}

impl Cors {
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.allowed_origin.clone(),
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, PATCH, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
        response.set_header(Header::new("Vary", "Origin"));
    }
}

/// Standard hardening headers on every response
pub struct SecurityHeaders;

const SECURITY_HEADERS: [(&str, &str); 11] = [
    ("Content-Security-Policy", "default-src 'none'; frame-ancestors 'none'"),
    ("Cross-Origin-Opener-Policy", "same-origin"),
    ("Cross-Origin-Resource-Policy", "same-origin"),
    ("Origin-Agent-Cluster", "?1"),
    ("Referrer-Policy", "no-referrer"),
    ("Strict-Transport-Security", "max-age=15552000; includeSubDomains"),
    ("X-Content-Type-Options", "nosniff"),
    ("X-DNS-Prefetch-Control", "off"),
    ("X-Frame-Options", "DENY"),
    ("X-Permitted-Cross-Domain-Policies", "none"),
    ("X-XSS-Protection", "0"),
];

#[rocket::async_trait]
impl Fairing for SecurityHeaders {
    fn info(&self) -> Info {
        Info {
            name: "Add security headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        for (name, value) in SECURITY_HEADERS {
            response.set_header(Header::new(name, value));
        }
    }
}

struct RequestStart(Instant);

/// Logs one line per request once the response is ready
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut rocket::Data<'_>) {
        request.local_cache(|| RequestStart(Instant::now()));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let started = request.local_cache(|| RequestStart(Instant::now()));
        let status = response.status();
        let elapsed_ms = started.0.elapsed().as_millis() as u64;

        if status.code >= 500 {
            error!(method = %request.method(), uri = %request.uri(), status = status.code, elapsed_ms, "request");
        } else if status.code >= 400 {
            warn!(method = %request.method(), uri = %request.uri(), status = status.code, elapsed_ms, "request");
        } else {
            info!(method = %request.method(), uri = %request.uri(), status = status.code, elapsed_ms, "request");
        }
    }
}

#[get("/health")]
pub async fn health(_limit: WithinApiQuota, db: &State<Database>) -> Json<HealthResponse> {
    handlers::health_handler(db).await
}

#[get("/auth/linkedin")]
pub async fn linkedin_login(
    _limit: WithinApiQuota,
    cookies: &CookieJar<'_>,
    services: &State<Services>,
) -> ApiResult<Redirect> {
    handlers::linkedin_login_handler(cookies, services).await
}

#[get("/auth/linkedin/callback?<code>&<state>&<error>")]
pub async fn linkedin_callback(
    _limit: WithinApiQuota,
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    cookies: &CookieJar<'_>,
    services: &State<Services>,
    db: &State<Database>,
    tokens: &State<TokenService>,
    config: &State<ServerConfig>,
) -> ApiResult<Redirect> {
    let params = CallbackParams { code, state, error };
    handlers::linkedin_callback_handler(params, cookies, services, db, tokens, config).await
}

#[get("/auth/me")]
pub async fn current_user(
    _limit: WithinApiQuota,
    auth: AuthenticatedUser,
) -> Json<ApiResponse<UserData>> {
    handlers::current_user_handler(auth).await
}

#[post("/auth/logout")]
pub async fn logout(
    _limit: WithinApiQuota,
    auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<ApiResponse<()>> {
    handlers::logout_handler(auth, cookies).await
}

#[post("/analysis", data = "<request>")]
pub async fn create_analysis(
    _limit: WithinApiQuota,
    _quota: WithinAnalysisQuota,
    auth: AuthenticatedUser,
    request: Json<AnalyzeRequest>,
    services: &State<Services>,
    db: &State<Database>,
) -> ApiResult<status::Custom<Json<ApiResponse<AnalyzeData>>>> {
    handlers::create_analysis_handler(request, auth, services, db).await
}

#[get("/analysis")]
pub async fn list_analyses(
    _limit: WithinApiQuota,
    _quota: WithinAnalysisQuota,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<AnalysisListData>>> {
    handlers::list_analyses_handler(auth, db).await
}

#[get("/analysis/<id>")]
pub async fn get_analysis(
    id: &str,
    _limit: WithinApiQuota,
    _quota: WithinAnalysisQuota,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<AnalysisDetailData>>> {
    handlers::get_analysis_handler(id, auth, db).await
}

#[delete("/analysis/<id>")]
pub async fn delete_analysis(
    id: &str,
    _limit: WithinApiQuota,
    _quota: WithinAnalysisQuota,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<()>>> {
    handlers::delete_analysis_handler(id, auth, db).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request body."))
}

#[rocket::catch(401)]
pub fn unauthorized(req: &Request) -> Json<ErrorResponse> {
    let failure = req.local_cache(|| AuthFailure(None));
    let message = failure
        .0
        .map(|reason| reason.message())
        .unwrap_or("Authentication required. Please log in.");

    Json(ErrorResponse::new(message))
}

#[rocket::catch(404)]
pub fn not_found(req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(format!(
        "Route not found: {} {}",
        req.method(),
        req.uri()
    )))
}

#[rocket::catch(413)]
pub fn payload_too_large() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Request body too large."))
}

#[rocket::catch(422)]
pub fn unprocessable_entity() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request body."))
}

#[rocket::catch(429)]
pub fn too_many_requests(req: &Request) -> Json<ErrorResponse> {
    let failure = req.local_cache(|| QuotaFailure(None));
    let message = failure
        .0
        .map(|limit| limit.message())
        .unwrap_or(rate_limit::API_LIMIT_MESSAGE);

    Json(ErrorResponse::new(message))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error"))
}

/// Assemble the server around already-constructed services
pub fn build_rocket(
    config: &AppConfig,
    db: Database,
    tokens: TokenService,
    services: Services,
) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", config.port))
        .merge(("limits", Limits::default().limit("json", 10.kibibytes())));

    rocket::custom(figment)
        .attach(Cors::new(config.client_url.clone()))
        .attach(SecurityHeaders)
        .attach(RequestLogger)
        .manage(db)
        .manage(tokens)
        .manage(services)
        .manage(ServerConfig {
            client_url: config.client_url.clone(),
        })
        .manage(ApiQuota(IpQuota::per_window(
            config.rate_limit.api_requests_per_window,
            Duration::from_secs(config.rate_limit.api_window_minutes.saturating_mul(60)),
        )))
        .manage(AnalysisQuota(IpQuota::per_hour(
            config.rate_limit.analyses_per_hour,
        )))
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                payload_too_large,
                unprocessable_entity,
                too_many_requests,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                health,
                linkedin_login,
                linkedin_callback,
                current_user,
                logout,
                create_analysis,
                list_analyses,
                get_analysis,
                delete_analysis,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let db = match Database::connect(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    let tokens = TokenService::from_config(&config.jwt)?;
    let services = Services {
        identity: Arc::new(LinkedInClient::new(config.linkedin.clone())?),
        analyzer: Arc::new(GeminiClient::new(config.gemini.clone())?),
    };

    info!(
        "Starting Flowbase API server on port {} [{}]",
        config.port, config.environment
    );
    info!("Database: {}", config.database_path.display());
    info!("Health check: http://localhost:{}/api/health", config.port);

    if let Err(e) = build_rocket(&config, db, tokens, services).launch().await {
        error!("Server failed: {}", e);
        anyhow::bail!("Server terminated with an error");
    }

    Ok(())
}
