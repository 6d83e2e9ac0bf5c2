//! Shared Kernel - Cross-crate error vocabulary
//!
//! This crate holds the pieces every other crate agrees on:
//! - [`error::kind::ErrorKind`], the HTTP-facing error classification
//! - [`error::app_error::AppError`], the unified error rendered to clients
//!
//! Keep it small. Anything domain specific belongs in the owning crate.

pub mod error {
    pub mod app_error;
    pub mod kind;
}
