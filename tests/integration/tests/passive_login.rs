//! Passive (silent) login tests.

use axum::http::StatusCode;
use ssp_core::{BridgeConfig, DefaultAuthenticator};
use ssp_integration_tests::{bridge_config, TestEnv};
use ssp_server::ServerConfig;
use ssp_session::SessionStore;
use ssp_storage::UserProvider;

fn passive_env(bridge: BridgeConfig) -> anyhow::Result<TestEnv> {
    TestEnv::with_config(bridge, ServerConfig::for_testing().with_passive_login(true))
}

/// A visitor with a live provider session is logged in on the way to the page.
#[tokio::test]
async fn test_passive_login_signs_in_silently() -> anyhow::Result<()> {
    let mut env = passive_env(bridge_config())?;

    let first = env.get("/").await?;
    assert_eq!(first.status, StatusCode::FOUND);
    assert_eq!(
        first.location(),
        Some("/Security/login?as=directory&BackURL=%2F")
    );

    let callback = first.location().expect("redirect").to_string();
    let page = env.follow(&callback, 5).await?;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(env.users.count().await?, 1);

    let session_id = env.session_id().expect("cookie").to_string();
    let session = env.sessions.load(&session_id).await?.expect("session");
    assert!(session.is_logged_in());
    Ok(())
}

/// A failed silent login returns to the page and is not retried.
#[tokio::test]
async fn test_passive_login_failure_returns_to_page_once() -> anyhow::Result<()> {
    let bridge = BridgeConfig {
        default_authenticator: Some(DefaultAuthenticator::Fixed("adfs".to_string())),
        ..bridge_config()
    };
    let mut env = passive_env(bridge)?;

    let first = env.get("/?page=1").await?;
    assert_eq!(first.status, StatusCode::FOUND);
    assert_eq!(first.location(), Some("/?page=1"));

    let second = env.get("/?page=1").await?;
    assert_eq!(second.status, StatusCode::OK);

    let third = env.get("/").await?;
    assert_eq!(third.status, StatusCode::OK);
    assert_eq!(env.users.count().await?, 0);
    Ok(())
}

/// Without the layer host pages are served untouched.
#[tokio::test]
async fn test_host_pages_untouched_when_disabled() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let page = env.get("/").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(env.session_id(), None);
    assert!(env.sessions.is_empty());
    Ok(())
}
