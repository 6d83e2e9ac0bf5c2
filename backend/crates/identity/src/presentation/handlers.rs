//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use platform::password::CredentialHasher;
use platform::token::TokenService;

use crate::application::{SignInInput, SignInUseCase, SignUpInput, SignUpUseCase};
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    CreateSessionRequest, CreateUserRequest, CreateUserResponse, SessionResponse, UserResponse,
};
use crate::presentation::extract::{ApiJson, CurrentUser};

/// Shared state for identity handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub hasher: CredentialHasher,
    pub tokens: Arc<TokenService>,
}

// ============================================================================
// Users
// ============================================================================

/// POST /users
pub async fn create_user<R>(
    State(state): State<AuthAppState<R>>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> AuthResult<(StatusCode, Json<CreateUserResponse>)>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.tokens.clone());

    let input = SignUpInput {
        login: req.login,
        username: req.username,
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user: UserResponse::from(&output.user),
            access_token: output.tokens.access_token,
            refresh_token: output.tokens.refresh_token,
        }),
    ))
}

// ============================================================================
// Sessions
// ============================================================================

/// POST /sessions
pub async fn create_session<R>(
    State(state): State<AuthAppState<R>>,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> AuthResult<Json<SessionResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.tokens.clone(),
    );

    let input = SignInInput {
        login_or_email: req.login_or_email,
        password: req.password,
    };

    let tokens = use_case.execute(input).await?;

    Ok(Json(SessionResponse::from(tokens)))
}

// ============================================================================
// Private
// ============================================================================

/// GET /private/whoami
pub async fn whoami(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
