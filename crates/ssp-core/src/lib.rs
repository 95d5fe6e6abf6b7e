//! # ssp-core
//!
//! Core configuration, error handling, and audit events for the SSP bridge.
//!
//! This crate provides the foundational types shared by every other crate in
//! the workspace: the [`BridgeConfig`] that names the identity sources, the
//! [`ConfigError`] raised when that configuration is unusable, and the
//! [`AuthEvent`] audit records emitted by the login and logout flows.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{
    AuthenticatorDescriptor, BridgeConfig, DefaultAuthenticator, DevProviderConfig, EnvironmentType,
};
pub use error::{ConfigError, ConfigResult};
pub use event::{AuthEvent, AuthEventBuilder, AuthEventType, EventOutcome, AUDIT_TARGET};
