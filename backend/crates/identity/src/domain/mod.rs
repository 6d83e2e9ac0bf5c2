//! Domain Layer
//!
//! Contains the user entity, its validation rules, and the repository trait.

pub mod entity;
pub mod repository;
pub mod validation;

// Re-exports
pub use entity::user::User;
pub use repository::{UserRepository, find_by_login_or_email};
pub use validation::{PasswordPolicy, ValidationError, validate};
