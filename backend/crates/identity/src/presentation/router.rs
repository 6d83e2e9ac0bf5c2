//! Identity Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, authenticate, require_auth};

/// Create the identity router for any repository implementation.
///
/// `/private` routes require a bearer token. Public routes never look at
/// the `Authorization` header.
pub fn identity_router<R>(repo: R, config: &AuthConfig) -> AuthResult<Router>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let tokens = Arc::new(config.token_service()?);
    let hasher = config.credential_hasher()?;

    let middleware_state = AuthMiddlewareState {
        repo: repo.clone(),
        tokens: tokens.clone(),
    };
    let state = AuthAppState {
        repo,
        hasher,
        tokens,
    };

    // Outer `authenticate` resolves the caller, `require_auth` insists on one
    let private = Router::new()
        .route("/whoami", get(handlers::whoami))
        .route_layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            require_auth::<R>,
        ))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            authenticate::<R>,
        ));

    Ok(Router::new()
        .route("/users", post(handlers::create_user::<R>))
        .route("/sessions", post(handlers::create_session::<R>))
        .nest("/private", private)
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryUserRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use platform::password::HashCost;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: b"router-test-secret".to_vec(),
            hash_cost: HashCost {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            ..Default::default()
        }
    }

    fn create_test_app() -> Router {
        let config = test_config();
        let repo = MemoryUserRepository::new(config.credential_hasher().unwrap());
        identity_router(repo, &config).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn whoami(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/private/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn alice() -> Value {
        json!({
            "login": "alice",
            "username": "alice",
            "email": "alice@example.com",
            "password": "Secret123"
        })
    }

    #[tokio::test]
    async fn test_alice_scenario() {
        let app = create_test_app();

        // Register
        let (status, body) = send(&app, post_json("/users", alice())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["login"], "alice");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("encrypted_password").is_none());
        assert!(body["access_token"].is_string());
        assert!(body["refresh_token"].is_string());

        // Login by email
        let (status, body) = send(
            &app,
            post_json(
                "/sessions",
                json!({"login_or_email": "alice@example.com", "password": "Secret123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access_token = body["access_token"].as_str().unwrap().to_string();
        assert!(body["refresh_token"].is_string());

        // Wrong password
        let (status, body) = send(
            &app,
            post_json(
                "/sessions",
                json!({"login_or_email": "alice@example.com", "password": "WrongPass1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "incorrect login/email or password");

        // Whoami with the issued token
        let bearer = format!("Bearer {access_token}");
        let (status, body) = send(&app, whoami(Some(&bearer))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["login"], "alice");
        assert_eq!(body["email"], "alice@example.com");
        assert!(body.get("password").is_none());

        // No header
        let (status, _) = send(&app, whoami(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Tampered token
        let mut tampered = access_token.into_bytes();
        let idx = tampered.len() - 10;
        tampered[idx] = if tampered[idx] == b'A' { b'B' } else { b'A' };
        let tampered = format!("Bearer {}", String::from_utf8(tampered).unwrap());
        let (status, body) = send(&app, whoami(Some(&tampered))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid token");
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_access_private_routes() {
        let app = create_test_app();
        let (_, body) = send(&app, post_json("/users", alice())).await;
        let refresh = format!("Bearer {}", body["refresh_token"].as_str().unwrap());

        let (status, _) = send(&app, whoami(Some(&refresh))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = create_test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["title"], "Bad Request");
    }

    #[tokio::test]
    async fn test_missing_session_fields_is_bad_request() {
        let app = create_test_app();
        let (status, body) = send(&app, post_json("/sessions", json!({"password": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "login/email and password are required");
    }

    #[tokio::test]
    async fn test_invalid_and_duplicate_users_are_unprocessable() {
        let app = create_test_app();

        let mut invalid = alice();
        invalid["login"] = json!("a".repeat(21));
        let (status, body) = send(&app, post_json("/users", invalid)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "login must be at most 20 characters");

        let (status, _) = send(&app, post_json("/users", alice())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, post_json("/users", alice())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "login is already taken");

        let mut same_email = alice();
        same_email["login"] = json!("alice2");
        let (status, body) = send(&app, post_json("/users", same_email)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "email is already registered");
    }

    #[tokio::test]
    async fn test_missing_user_fields_fail_validation() {
        let app = create_test_app();
        let (status, body) = send(&app, post_json("/users", json!({"login": "alice"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "username is required");
    }

    #[tokio::test]
    async fn test_public_routes_ignore_authorization_header() {
        let app = create_test_app();
        let mut request = post_json("/users", alice());
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Token abc".parse().unwrap());

        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);

        // a stale token must not block signing in again
        let mut request = post_json(
            "/sessions",
            json!({"login_or_email": "alice", "password": "Secret123"}),
        );
        request.headers_mut().insert(
            header::AUTHORIZATION,
            "Bearer expired.or.stale".parse().unwrap(),
        );

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_token"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_authorization_header_rejected_on_private_route() {
        let app = create_test_app();
        let (status, _) = send(&app, whoami(Some("Token abc"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, whoami(Some("Bearer a b"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sign_in_by_login_then_whoami() {
        let app = create_test_app();
        send(&app, post_json("/users", alice())).await;

        let (status, body) = send(
            &app,
            post_json(
                "/sessions",
                json!({"login_or_email": "alice", "password": "Secret123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_expires_at"].as_i64().unwrap() < body["refresh_expires_at"].as_i64().unwrap());

        let bearer = format!("Bearer {}", body["access_token"].as_str().unwrap());
        let (status, body) = send(&app, whoami(Some(&bearer))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
    }
}
