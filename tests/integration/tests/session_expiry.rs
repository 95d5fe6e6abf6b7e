//! Session lifetime tests.

use std::time::Duration;

use axum::http::StatusCode;
use ssp_integration_tests::{bridge_config, TestEnv};
use ssp_server::ServerConfig;
use ssp_session::{InMemorySessionStore, SessionStore, SessionTimeouts};

/// Visits without a cookie leave records behind until they expire and are swept.
#[tokio::test]
async fn test_cookieless_visits_are_swept() -> anyhow::Result<()> {
    let store = InMemorySessionStore::with_timeouts(SessionTimeouts::from_secs(0, 3600));
    let mut env = TestEnv::with_sessions(bridge_config(), ServerConfig::for_testing(), store)?;

    for _ in 0..100 {
        env.clear_cookies();
        env.get("/Security/login?as=adfs").await?;
    }
    assert_eq!(env.sessions.len(), 100);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(env.sessions.remove_expired().await?, 100);
    assert!(env.sessions.is_empty());
    Ok(())
}

/// An expired session is not resumed; the browser gets a fresh one.
#[tokio::test]
async fn test_expired_session_starts_over() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;
    let old_id = env.session_id().expect("cookie").to_string();

    let mut session = env.sessions.load(&old_id).await?.expect("session");
    session.updated_at -= chrono::Duration::hours(2);
    env.sessions.save(&session).await?;

    let response = env.get("/Security/login?as=adfs").await?;
    let location = response.location().expect("redirect");
    assert!(location.contains("AuthId=adfs"), "got {location}");

    assert_ne!(env.session_id(), Some(old_id.as_str()));
    assert!(env.sessions.load(&old_id).await?.is_none());
    Ok(())
}

/// Plain HTTP without a usable host is refused rather than served.
#[tokio::test]
async fn test_plain_http_without_host_is_refused() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    for host in [None, Some("evil.example/x")] {
        let response = env
            .get_insecure_with_host("/Security/login?as=directory", host)
            .await?;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "host {host:?}");
    }
    assert_eq!(env.directory.active_sessions(), 0);
    Ok(())
}
