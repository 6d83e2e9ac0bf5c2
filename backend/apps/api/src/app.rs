//! HTTP application assembly
//!
//! Wraps the identity routes with request IDs, tracing, and CORS.

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use identity::domain::repository::UserRepository;
use identity::{AuthConfig, AuthResult, identity_router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub fn build_app<R>(repo: R, auth: &AuthConfig) -> AuthResult<Router>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    // Any origin may call the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    // Outermost layer last: the ID is set before tracing sees the request
    Ok(identity_router(repo, auth)?
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(
            REQUEST_ID_HEADER.clone(),
            MakeRequestUuid,
        ))
        .layer(cors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};
    use identity::infra::memory::MemoryUserRepository;
    use platform::password::HashCost;
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        let auth = AuthConfig {
            jwt_secret: b"api-test-secret".to_vec(),
            hash_cost: HashCost {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            ..Default::default()
        };
        let repo = MemoryUserRepository::new(auth.credential_hasher().unwrap());
        build_app(repo, &auth).unwrap()
    }

    fn whoami() -> axum::http::request::Builder {
        Request::builder().method("GET").uri("/private/whoami")
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = create_test_app()
            .oneshot(whoami().body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let id = response.headers().get("x-request-id").unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_request_id_preserved() {
        let response = create_test_app()
            .oneshot(
                whoami()
                    .header("x-request-id", "client-supplied-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "client-supplied-id"
        );
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = create_test_app()
            .oneshot(
                whoami()
                    .header(header::ORIGIN, "https://somewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_error_body_is_problem_details() {
        let response = create_test_app()
            .oneshot(whoami().body(Body::empty()).unwrap())
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 401);
        assert_eq!(body["title"], "Unauthorized");
    }
}
