//! # ssp-model
//!
//! Domain models for the SSP bridge.
//!
//! - [`LocalUser`] - the application's own user record, matched by email
//! - [`FederatedAttributeSet`] - attributes released by an identity provider

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod attributes;
pub mod user;

pub use attributes::FederatedAttributeSet;
pub use user::LocalUser;
