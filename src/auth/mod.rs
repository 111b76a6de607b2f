// src/auth/mod.rs
pub mod guard;
pub mod linkedin;
pub mod token;

pub use guard::{AuthError, AuthFailure, AuthenticatedUser, TOKEN_COOKIE};
pub use linkedin::{IdentityProvider, LinkedInClient, LinkedInProfile};
pub use token::{Claims, TokenError, TokenService};
