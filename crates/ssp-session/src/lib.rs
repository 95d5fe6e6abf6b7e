//! # ssp-session
//!
//! Session state for the SSP bridge.
//!
//! A browser session is identified by an opaque id carried in a cookie.
//! Its [`SessionState`] is loaded once at the start of a request and saved
//! once at the end, which is the only thing linking the two halves of a
//! login that leaves the site for the identity provider.
//!
//! ## Components
//!
//! - [`SessionState`] - authenticator binding, back-URL, passive flag, login state
//! - [`SessionStore`] - persistence trait, with [`InMemorySessionStore`]
//! - [`SessionTimeouts`] - idle and absolute limits after which a session is gone

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod state;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use state::{
    AuthState, AuthenticatorBinding, SessionState, SessionTimeouts, MAX_SESSION_ID_LEN,
};
pub use store::{InMemorySessionStore, SessionStore};
