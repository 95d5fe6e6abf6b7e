//! Logout flow tests.

use axum::http::StatusCode;
use ssp_integration_tests::{TestEnv, LOGGED_OUT_URL};
use ssp_server::cookies::{PROVIDER_TOKEN_COOKIE_NAME, SESSION_COOKIE_NAME};
use ssp_session::SessionStore;

/// Logout goes through the provider and ends the local session on return.
#[tokio::test]
async fn test_logout_then_loggedout() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;
    let session_id = env.session_id().expect("cookie").to_string();
    assert_eq!(env.directory.active_sessions(), 1);

    let logout = env.get("/Security/logout").await?;
    assert_eq!(logout.status, StatusCode::FOUND);
    assert_eq!(logout.location(), Some("/Security/loggedout"));
    assert_eq!(env.directory.active_sessions(), 0);

    let done = env.get("/Security/loggedout").await?;
    assert_eq!(done.status, StatusCode::FOUND);
    assert_eq!(done.location(), Some(LOGGED_OUT_URL));
    assert!(done.expires_cookie(SESSION_COOKIE_NAME));
    assert!(done.expires_cookie(PROVIDER_TOKEN_COOKIE_NAME));

    assert!(env.sessions.load(&session_id).await?.is_none());
    assert_eq!(env.session_id(), None);
    Ok(())
}

/// A back-URL given to logout is honoured after the provider returns.
#[tokio::test]
async fn test_logout_back_url() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;

    env.get("/Security/logout?BackURL=%2Fsee-you").await?;
    let done = env.get("/Security/loggedout").await?;
    assert_eq!(done.location(), Some("/see-you"));
    Ok(())
}

/// Logging out without a federation session skips the provider.
#[tokio::test]
async fn test_logout_without_login() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let logout = env.get("/Security/logout").await?;
    assert_eq!(logout.location(), Some("/Security/loggedout"));

    let done = env.get("/Security/loggedout").await?;
    assert_eq!(done.location(), Some(LOGGED_OUT_URL));
    assert!(env.sessions.is_empty());
    Ok(())
}

/// After logout the next login starts from scratch.
#[tokio::test]
async fn test_login_after_logout_starts_over() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;
    env.follow("/Security/logout", 5).await?;

    let first = env.get("/Security/login?as=adfs").await?;
    let location = first.location().expect("redirect");
    assert!(location.contains("AuthId=adfs"), "got {location}");
    Ok(())
}
