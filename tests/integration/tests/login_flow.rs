//! Login flow tests.

use axum::http::StatusCode;
use ssp_integration_tests::{TestEnv, HOST, LOGGED_IN_URL};
use ssp_model::FederatedAttributeSet;
use ssp_session::SessionStore;
use ssp_storage::UserProvider;

/// Provisions a local user from directory attributes and lands on the
/// default logged-in page.
#[tokio::test]
async fn test_directory_login_creates_user() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    // First pass: the provider authenticates and sends the browser back
    let first = env.get("/Security/login?as=directory").await?;
    assert_eq!(first.status, StatusCode::FOUND);
    assert_eq!(first.location(), Some("/Security/login?as=directory"));
    let anonymous_id = env.session_id().map(str::to_string);
    assert!(anonymous_id.is_some(), "first pass should start a session");

    // Second pass: the bridge logs in the local user
    let second = env.get("/Security/login?as=directory").await?;
    assert_eq!(second.status, StatusCode::FOUND);
    assert_eq!(second.location(), Some(LOGGED_IN_URL));

    let user = env
        .users
        .get_by_email("a@x.com")
        .await?
        .expect("user should be provisioned");
    assert_eq!(user.username, "auser");
    assert_eq!(user.first_name.as_deref(), Some("A"));
    assert_eq!(user.surname.as_deref(), Some("User"));
    assert_eq!(user.email, "a@x.com");
    assert_eq!(user.source.as_deref(), Some("directory"));

    // The session moved to the provider's id and is logged in
    let session_id = env.session_id().expect("cookie should be set").to_string();
    assert_ne!(Some(session_id.clone()), anonymous_id);
    let session = env.sessions.load(&session_id).await?.expect("session stored");
    assert!(session.is_logged_in());
    assert_eq!(session.user_id, Some(user.id));
    assert_eq!(
        session.binding.map(|b| b.source_name),
        Some("directory".to_string())
    );
    if let Some(old) = anonymous_id {
        assert!(env.sessions.load(&old).await?.is_none());
    }

    Ok(())
}

/// Logging in twice reuses the existing user.
#[tokio::test]
async fn test_repeated_login_is_idempotent() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    env.follow("/Security/login?as=directory", 5).await?;
    env.clear_cookies();
    env.directory.expire_all();
    env.follow("/Security/login?as=directory", 5).await?;

    assert_eq!(env.users.count().await?, 1);
    Ok(())
}

/// A captured back-URL wins over the default and is consumed.
#[tokio::test]
async fn test_back_url_redirect_and_clear() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    env.get("/Security/login?as=directory&BackURL=%2Fdashboard")
        .await?;
    let done = env.get("/Security/login?as=directory").await?;
    assert_eq!(done.location(), Some("/dashboard"));

    let session_id = env.session_id().expect("cookie").to_string();
    let session = env.sessions.load(&session_id).await?.expect("session");
    assert_eq!(session.back_url, None);

    // A later login falls back to the default
    let again = env.get("/Security/login").await?;
    assert_eq!(again.location(), Some(LOGGED_IN_URL));
    Ok(())
}

/// Back-URLs pointing at other sites are ignored.
#[tokio::test]
async fn test_foreign_back_url_is_ignored() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    env.get("/Security/login?as=directory&BackURL=https%3A%2F%2Fevil.example%2F")
        .await?;
    let done = env.get("/Security/login?as=directory").await?;
    assert_eq!(done.location(), Some(LOGGED_IN_URL));

    let same_site = format!("https%3A%2F%2F{HOST}%2Freports");
    env.clear_cookies();
    env.directory.expire_all();
    env.get(&format!("/Security/login?as=directory&BackURL={same_site}"))
        .await?;
    let done = env.get("/Security/login?as=directory").await?;
    assert_eq!(done.location(), Some("/reports"));
    Ok(())
}

/// The source a session is bound to is kept while its federation session lives.
#[tokio::test]
async fn test_bound_source_wins_over_request() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;

    let response = env.get("/Security/login?as=adfs").await?;
    assert_eq!(response.location(), Some(LOGGED_IN_URL));
    assert_eq!(env.adfs.active_sessions(), 0);
    Ok(())
}

/// An expired federation session clears the binding and resolution starts over.
#[tokio::test]
async fn test_expired_binding_resolves_again() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;
    env.follow("/Security/login?as=directory", 5).await?;

    env.directory.expire_all();
    let response = env.get("/Security/login?as=adfs").await?;

    let location = response.location().expect("redirect");
    assert!(
        location.contains("AuthId=adfs"),
        "should be sent to the adfs provider, got {location}"
    );
    let session_id = env.session_id().expect("cookie").to_string();
    let session = env.sessions.load(&session_id).await?.expect("session");
    assert!(session.binding.is_none());
    Ok(())
}

/// Naming a source that is not configured is a server error.
#[tokio::test]
async fn test_unknown_source_is_server_error() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let response = env.get("/Security/login?as=kerberos").await?;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = serde_json::from_str(&response.body)?;
    assert_eq!(body["error"], "configuration_error");
    assert!(!response.body.contains("kerberos"));
    Ok(())
}

/// Missing required attributes surface as a provider failure.
#[tokio::test]
async fn test_missing_email_is_bad_gateway() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    // Establish a provider session that releases no email
    env.get("/Security/login?as=adfs").await?;
    let session_id = env.session_id().expect("cookie").to_string();
    let mut session = env.sessions.load(&session_id).await?.expect("session");
    env.adfs
        .authenticate_session(&mut session, FederatedAttributeSet::new());
    env.sessions.save(&session).await?;

    let response = env.get("/Security/login?as=adfs").await?;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(env.users.count().await?, 0);
    Ok(())
}

/// Plain HTTP is upgraded before anything else happens.
#[tokio::test]
async fn test_plain_http_is_upgraded() -> anyhow::Result<()> {
    let mut env = TestEnv::new()?;

    let response = env.get_insecure("/Security/login?as=directory").await?;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("https://{HOST}/Security/login?as=directory").as_str())
    );
    assert_eq!(env.directory.active_sessions(), 0);
    Ok(())
}
