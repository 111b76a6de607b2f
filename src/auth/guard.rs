// src/auth/guard.rs
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use tracing::{error, warn};

use super::token::{TokenError, TokenService};
use crate::database::{Database, User};

pub const TOKEN_COOKIE: &str = "token";

/// A request made by a signed-in user that still exists
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    UnknownUser,
    DatabaseError,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authentication required. Please log in.",
            AuthError::InvalidToken => "Invalid token. Please log in again.",
            AuthError::ExpiredToken => "Token expired. Please log in again.",
            AuthError::UnknownUser => "User no longer exists.",
            AuthError::DatabaseError => "Internal server error",
        }
    }

    fn status(&self) -> Status {
        match self {
            AuthError::DatabaseError => Status::InternalServerError,
            _ => Status::Unauthorized,
        }
    }
}

/// Why authentication failed for this request, read back by the 401 catcher
pub struct AuthFailure(pub Option<AuthError>);

fn fail(req: &Request<'_>, err: AuthError) -> Outcome<AuthenticatedUser, AuthError> {
    req.local_cache(|| AuthFailure(Some(err)));
    Outcome::Error((err.status(), err))
}

/// Bearer header first, then the session cookie
fn extract_token(req: &Request<'_>) -> Option<String> {
    let bearer = req
        .headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => req
            .cookies()
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let (Some(tokens), Some(db)) = (
            req.rocket().state::<TokenService>(),
            req.rocket().state::<Database>(),
        ) else {
            error!("Authentication services are not managed");
            return fail(req, AuthError::DatabaseError);
        };

        let Some(token) = extract_token(req) else {
            warn!(path = %req.uri(), "Missing authentication token");
            return fail(req, AuthError::MissingToken);
        };

        let claims = match tokens.verify(&token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                warn!("Expired session token");
                return fail(req, AuthError::ExpiredToken);
            }
            Err(TokenError::Invalid(e)) => {
                warn!("Token verification failed: {}", e);
                return fail(req, AuthError::InvalidToken);
            }
        };

        match db.users().find_by_id(&claims.user_id).await {
            Ok(Some(user)) => Outcome::Success(AuthenticatedUser { user }),
            Ok(None) => {
                warn!(user_id = %claims.user_id, "Token refers to a deleted user");
                fail(req, AuthError::UnknownUser)
            }
            Err(e) => {
                error!("Failed to load authenticated user: {:#}", e);
                fail(req, AuthError::DatabaseError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            AuthError::MissingToken.message(),
            "Authentication required. Please log in."
        );
        assert_eq!(
            AuthError::ExpiredToken.message(),
            "Token expired. Please log in again."
        );
        assert_eq!(AuthError::UnknownUser.status(), Status::Unauthorized);
        assert_eq!(
            AuthError::DatabaseError.status(),
            Status::InternalServerError
        );
    }
}
