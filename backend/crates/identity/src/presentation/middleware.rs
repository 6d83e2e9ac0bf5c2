//! Auth Middleware
//!
//! Bearer-token authentication in two modes:
//! - [`authenticate`]: optional. No header passes through; a present but
//!   bad header or token is rejected.
//! - [`require_auth`]: strict. A missing header is rejected too.
//!
//! On success the caller is stored as [`CurrentUser`] in request
//! extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::token::TokenService;

use crate::application::AuthenticateUseCase;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::extract::CurrentUser;

const BEARER: &str = "Bearer";

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub tokens: Arc<TokenService>,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// `Ok(None)` when the header is absent. Anything other than exactly a
/// scheme and one token is an error.
fn bearer_token(headers: &HeaderMap) -> AuthResult<Option<String>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::Unauthorized)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty() =>
        {
            Ok(Some(token.to_string()))
        }
        _ => {
            tracing::debug!("Malformed Authorization header");
            Err(AuthError::Unauthorized)
        }
    }
}

async fn resolve<R>(state: &AuthMiddlewareState<R>, token: &str) -> AuthResult<CurrentUser>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.tokens.clone());
    let user = use_case.execute(token).await?;
    Ok(CurrentUser(user))
}

/// Middleware that authenticates when credentials are offered
pub async fn authenticate<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    if let Some(token) = bearer_token(req.headers())? {
        let user = resolve(&state, &token).await?;
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

/// Middleware that requires a valid bearer token
pub async fn require_auth<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    // Already resolved by an outer `authenticate` layer
    if req.extensions().get::<CurrentUser>().is_some() {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(req.headers())?.ok_or(AuthError::Unauthorized)?;
    let user = resolve(&state, &token).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
