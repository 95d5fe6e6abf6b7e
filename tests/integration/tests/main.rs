//! End-to-end tests for the SSP bridge.
//!
//! These drive the full router in process with in-memory stores and the
//! development identity provider.

mod login_flow;
mod logout_flow;
mod passive_login;
mod routes;
mod session_expiry;
