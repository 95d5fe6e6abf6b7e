//! Route-level behavior: headers, keep-alive, portal and mounting.

use axum::http::{header, StatusCode};
use ssp_integration_tests::{bridge_config, TestEnv, HOST};
use ssp_server::ServerConfig;
use ssp_session::SessionStore;

/// Every auth action forbids framing by other origins, errors included.
#[tokio::test]
async fn test_frame_options_on_every_action() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    for uri in [
        "/Security",
        "/Security/ping",
        "/Security/login?as=directory",
        "/Security/login?as=kerberos",
        "/Security/logout",
        "/Security/loggedout",
        "/Security/LoginForm",
    ] {
        let response = env.get(uri).await?;
        assert_eq!(
            response.headers.get(header::X_FRAME_OPTIONS).map(|v| v.as_bytes()),
            Some(b"SAMEORIGIN".as_slice()),
            "missing X-Frame-Options on {uri}"
        );
    }
    Ok(())
}

/// Ping answers `1` without creating a session.
#[tokio::test]
async fn test_ping() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let response = env.get_insecure("/Security/ping").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "1");
    assert!(env.sessions.is_empty());
    assert_eq!(env.session_id(), None);
    Ok(())
}

/// The index action sends the browser to the provider's portal.
#[tokio::test]
async fn test_index_redirects_to_portal() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let response = env.get("/Security").await?;
    assert_eq!(response.status, StatusCode::FOUND);
    let location = response.location().expect("redirect");
    assert!(location.contains("frontpage_welcome"), "got {location}");
    Ok(())
}

/// `LoginForm` forces a new provider login and returns to the referring page.
#[tokio::test]
async fn test_login_form_uses_referer() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;
    let session_id = env.session_id().expect("cookie").to_string();

    let referer = format!("https://{HOST}/pages/about");
    let response = env
        .get_with_referer("/Security/LoginForm", &referer)
        .await?;
    assert_eq!(response.location(), Some("/Security/login?as=directory"));

    let session = env.sessions.load(&session_id).await?.expect("session");
    assert_eq!(session.back_url.as_deref(), Some("/pages/about"));

    let done = env.get("/Security/login?as=directory").await?;
    assert_eq!(done.location(), Some("/pages/about"));
    Ok(())
}

/// With the bridge disabled the auth actions are not mounted.
#[tokio::test]
async fn test_disabled_bridge_mounts_nothing() -> anyhow::Result<()> {
    let bridge = ssp_core::BridgeConfig {
        enable_auth: false,
        ..bridge_config()
    };
    let mut env = TestEnv::with_config(bridge, ServerConfig::for_testing())?;

    let response = env.get("/Security/login").await?;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let health = env.get("/health").await?;
    assert_eq!(health.status, StatusCode::OK);
    Ok(())
}

/// Upgrading to HTTPS can be turned off.
#[tokio::test]
async fn test_transport_security_can_be_disabled() -> anyhow::Result<()> {
    let bridge = ssp_core::BridgeConfig {
        force_transport_security: false,
        ..bridge_config()
    };
    let mut env = TestEnv::with_config(bridge, ServerConfig::for_testing())?;

    let response = env.get_insecure("/Security/login?as=directory").await?;
    assert_eq!(response.location(), Some("/Security/login?as=directory"));
    Ok(())
}
