//! Extension points around login and logout.

use async_trait::async_trait;
use ssp_model::LocalUser;
use uuid::Uuid;

/// Callbacks fired after the bridge finishes a login or logout.
///
/// Both methods do nothing by default.
#[async_trait]
pub trait AuthHooks: Send + Sync {
    /// Called once a local user has been logged in.
    async fn on_after_login(&self, _source_name: &str, _user: &LocalUser) {}

    /// Called once the local session has been ended.
    async fn on_after_logout(&self, _source_name: Option<&str>, _user_id: Option<Uuid>) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl AuthHooks for NoopHooks {}
