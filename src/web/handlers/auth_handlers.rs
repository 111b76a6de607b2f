// src/web/handlers/auth_handlers.rs
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::time::Duration;
use rocket::State;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, TokenService, TOKEN_COOKIE};
use crate::database::Database;
use crate::error::ApiResult;
use crate::web::types::{ApiResponse, ServerConfig, Services, UserData};

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

pub async fn linkedin_login_handler(
    cookies: &CookieJar<'_>,
    services: &State<Services>,
) -> ApiResult<Redirect> {
    let state = Uuid::new_v4().simple().to_string();
    let url = services.identity.authorization_url(&state)?;

    cookies.add_private(
        Cookie::build((OAUTH_STATE_COOKIE, state))
            .path("/api/auth")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::minutes(10)),
    );

    Ok(Redirect::to(url))
}

/// Query parameters LinkedIn appends when sending the user back
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn linkedin_callback_handler(
    params: CallbackParams,
    cookies: &CookieJar<'_>,
    services: &State<Services>,
    db: &State<Database>,
    tokens: &State<TokenService>,
    config: &State<ServerConfig>,
) -> ApiResult<Redirect> {
    let expected_state = cookies
        .get_private(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    cookies.remove_private(Cookie::build(OAUTH_STATE_COOKIE).path("/api/auth"));

    if let Some(error) = params.error {
        warn!(error = %error, "LinkedIn OAuth denied");
        return Ok(Redirect::to(config.login_error_url("access_denied")));
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return Ok(Redirect::to(config.login_error_url("no_code")));
    };

    if expected_state.is_none() || params.state != expected_state {
        warn!("LinkedIn OAuth state mismatch");
        return Ok(Redirect::to(config.login_error_url("invalid_state")));
    }

    let access_token = services.identity.exchange_code(&code).await?;
    let profile = services.identity.fetch_profile(&access_token).await?;
    let user = db.users().upsert_from_linkedin(&profile, &access_token).await?;
    let token = tokens.issue(&user.id)?;

    info!(user_id = %user.id, "User authenticated via LinkedIn");

    Ok(Redirect::to(config.auth_callback_url(&token)))
}

pub async fn current_user_handler(auth: AuthenticatedUser) -> Json<ApiResponse<UserData>> {
    Json(ApiResponse::ok(
        UserData { user: auth.user },
        "User profile retrieved",
    ))
}

pub async fn logout_handler(
    auth: AuthenticatedUser,
    cookies: &CookieJar<'_>,
) -> Json<ApiResponse<()>> {
    cookies.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    info!(user_id = %auth.id(), "User logged out");

    Json(ApiResponse::empty("Logged out successfully"))
}
