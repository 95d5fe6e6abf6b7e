//! # ssp-auth
//!
//! Authenticator resolution and federated user reconciliation.
//!
//! This crate decides which identity source governs a request, drives that
//! source's identity provider adapter, and maps the identity it releases
//! onto a local user.
//!
//! ## Components
//!
//! - [`AuthenticatorRegistry`] - resolves a source from the request and configuration
//! - [`Authenticator`] - per-source find-or-create of the local user
//! - [`SessionBinder`] - keeps the chosen authenticator bound to the browser session
//! - [`IdentityProvider`] - adapter over the external federation client
//!
//! ## Example
//!
//! ```ignore
//! use ssp_auth::{AuthenticatorRegistry, SessionBinder};
//!
//! let registry = Arc::new(AuthenticatorRegistry::new(config, env, providers, users));
//! registry.validate()?;
//!
//! let binder = SessionBinder::new(registry);
//! let authenticator = binder.current(&mut session, Some("ldap")).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod authenticator;
pub mod binder;
pub mod error;
pub mod hooks;
pub mod memory;
pub mod profile;
pub mod provider;
pub mod registry;

pub use authenticator::Authenticator;
pub use binder::SessionBinder;
pub use error::{AuthError, AuthResult};
pub use hooks::{AuthHooks, NoopHooks};
pub use memory::InMemoryIdentityProvider;
pub use profile::{AttributeProfile, ClaimsMapper, UserClaims, CLAIMS, DIRECTORY};
pub use provider::{
    IdentityProvider, IdentityProviderFactory, LoginOptions, LogoutOptions, ProviderOutcome,
    StaticProviderFactory,
};
pub use registry::{AuthenticatorRegistry, Resolution};
