//! # ssp-storage-sql
//!
//! `SQLx`-based `PostgreSQL` storage for local users.
//!
//! The `local_users` table carries a unique index on the lowercased email,
//! so concurrent find-or-create calls for one address resolve to a single
//! row. A unique violation is reported as
//! [`StorageError::Duplicate`](ssp_storage::StorageError::Duplicate).

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

mod convert;
mod entities;
pub mod error;
pub mod pool;
pub mod user;

pub use pool::{create_pool, run_migrations, PoolConfig};
pub use user::PgUserProvider;
