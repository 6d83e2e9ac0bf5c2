//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extract::{ApiJson, CurrentUser};
pub use handlers::AuthAppState;
pub use middleware::{AuthMiddlewareState, authenticate, require_auth};
pub use router::identity_router;
