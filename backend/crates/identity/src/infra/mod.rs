//! Infrastructure Layer
//!
//! Repository backends and the factory that chooses between them.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;
pub use store::{StorageBackend, StorageConfig, UserStore};
