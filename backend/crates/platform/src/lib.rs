//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the cryptographic building blocks the identity
//! service sits on:
//! - Password hashing (Argon2id, tunable work factor)
//! - Signed bearer tokens (HS256 JWT, access + refresh pair)
//!
//! Nothing here knows about users or storage.

pub mod password;
pub mod token;
