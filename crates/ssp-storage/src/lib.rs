//! # ssp-storage
//!
//! Storage abstraction for local users.
//!
//! The bridge only needs to create users and look them up by id or by
//! their unique email. Backends report a unique-email conflict as
//! [`StorageError::Duplicate`] so callers can resolve creation races.
//!
//! ## Providers
//!
//! - [`UserProvider`] - the storage trait
//! - [`InMemoryUserProvider`] - a concurrent in-process implementation

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod user;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryUserProvider;
pub use user::UserProvider;
