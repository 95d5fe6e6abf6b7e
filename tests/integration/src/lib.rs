//! # ssp-integration-tests
//!
//! Test harness driving the bridge router in process.
//!
//! [`TestEnv`] wires the router to in-memory user and session stores and to
//! one development identity provider per source, and keeps a one-cookie jar
//! so consecutive requests share a browser session.
//!
//! Two sources are configured:
//! - `directory` completes every login at once with [`directory_attributes`]
//! - `adfs` never completes a login by itself

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use ssp_auth::{InMemoryIdentityProvider, StaticProviderFactory};
use ssp_core::{AuthenticatorDescriptor, BridgeConfig, EnvironmentType};
use ssp_model::FederatedAttributeSet;
use ssp_server::{cookies::SESSION_COOKIE_NAME, Server, ServerConfig};
use ssp_session::InMemorySessionStore;
use ssp_storage::InMemoryUserProvider;
use tower::ServiceExt;

/// Host header sent with every request.
pub const HOST: &str = "bridge.test";

/// Default logged-in URL of the test configuration.
pub const LOGGED_IN_URL: &str = "/admin";

/// Default logged-out URL of the test configuration.
pub const LOGGED_OUT_URL: &str = "/goodbye";

/// Attributes released by the `directory` source.
#[must_use]
pub fn directory_attributes() -> FederatedAttributeSet {
    FederatedAttributeSet::new()
        .with("mail", "a@x.com")
        .with("sAMAccountName", "auser")
        .with("givenName", "A")
        .with("sn", "User")
}

/// Bridge configuration used by [`TestEnv::new`].
#[must_use]
pub fn bridge_config() -> BridgeConfig {
    BridgeConfig {
        authenticators: vec![
            AuthenticatorDescriptor::new("directory", "directory"),
            AuthenticatorDescriptor::new("adfs", "claims"),
        ],
        default_logged_in_url: LOGGED_IN_URL.to_string(),
        default_logged_out_url: LOGGED_OUT_URL.to_string(),
        ..BridgeConfig::default()
    }
}

/// A response with its body read.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body as text.
    pub body: String,
}

impl TestResponse {
    /// Returns the `Location` header.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns every `Set-Cookie` header.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Checks whether a cookie was expired by this response.
    #[must_use]
    pub fn expires_cookie(&self, name: &str) -> bool {
        let prefix = format!("{name}=;");
        self.set_cookies()
            .iter()
            .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
    }
}

/// In-process test environment.
pub struct TestEnv {
    router: Router,
    /// Provider behind the `directory` source.
    pub directory: Arc<InMemoryIdentityProvider>,
    /// Provider behind the `adfs` source.
    pub adfs: Arc<InMemoryIdentityProvider>,
    /// Local user store.
    pub users: Arc<InMemoryUserProvider>,
    /// Session store.
    pub sessions: Arc<InMemorySessionStore>,
    session_cookie: Option<String>,
}

impl TestEnv {
    /// Creates an environment with the default test configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the configuration.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(bridge_config(), ServerConfig::for_testing())
    }

    /// Creates an environment with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the configuration.
    pub fn with_config(bridge: BridgeConfig, config: ServerConfig) -> anyhow::Result<Self> {
        Self::with_sessions(bridge, config, InMemorySessionStore::new())
    }

    /// Creates an environment over a given session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the configuration.
    pub fn with_sessions(
        bridge: BridgeConfig,
        config: ServerConfig,
        sessions: InMemorySessionStore,
    ) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ssp_server=debug,ssp_auth=debug,ssp::audit=info")
            .with_test_writer()
            .try_init();

        let directory = Arc::new(
            InMemoryIdentityProvider::new("directory")
                .with_auto_authenticate(directory_attributes()),
        );
        let adfs = Arc::new(InMemoryIdentityProvider::new("adfs"));
        let providers = StaticProviderFactory::new()
            .with(directory.clone())
            .with(adfs.clone());
        let users = Arc::new(InMemoryUserProvider::new());
        let sessions = Arc::new(sessions);

        let config = ServerConfig {
            environment: EnvironmentType::Dev,
            ..config
        };
        let server = Server::from_parts(
            config,
            bridge,
            Arc::new(providers),
            users.clone(),
            sessions.clone(),
        )?;

        Ok(Self {
            router: server.test_router(),
            directory,
            adfs,
            users,
            sessions,
            session_cookie: None,
        })
    }

    /// Returns the session id held in the cookie jar.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Forgets the session cookie, as a new browser would.
    pub fn clear_cookies(&mut self) {
        self.session_cookie = None;
    }

    /// Sends a `GET` over HTTPS (as reported by a proxy).
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn get(&mut self, uri: &str) -> anyhow::Result<TestResponse> {
        self.send(self.request(uri).header("x-forwarded-proto", "https"))
            .await
    }

    /// Sends a `GET` over plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn get_insecure(&mut self, uri: &str) -> anyhow::Result<TestResponse> {
        self.send(self.request(uri)).await
    }

    /// Sends a `GET` over plain HTTP with the given `Host` header, or none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn get_insecure_with_host(
        &mut self,
        uri: &str,
        host: Option<&str>,
    ) -> anyhow::Result<TestResponse> {
        self.send(self.request_to(uri, host)).await
    }

    /// Sends a `GET` over HTTPS with a `Referer` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body read.
    pub async fn get_with_referer(
        &mut self,
        uri: &str,
        referer: &str,
    ) -> anyhow::Result<TestResponse> {
        self.send(
            self.request(uri)
                .header("x-forwarded-proto", "https")
                .header(header::REFERER, referer),
        )
        .await
    }

    /// Follows redirects to local paths, up to `limit` hops, and returns the
    /// last response.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or the limit is reached.
    pub async fn follow(&mut self, uri: &str, limit: usize) -> anyhow::Result<TestResponse> {
        let mut response = self.get(uri).await?;
        for _ in 0..limit {
            match response.location() {
                Some(next) if next.starts_with('/') => {
                    let next = next.to_string();
                    response = self.get(&next).await?;
                }
                _ => return Ok(response),
            }
        }
        anyhow::bail!("redirect limit reached at {:?}", response.location())
    }

    fn request(&self, uri: &str) -> axum::http::request::Builder {
        self.request_to(uri, Some(HOST))
    }

    fn request_to(&self, uri: &str, host: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().uri(uri);
        let builder = match host {
            Some(host) => builder.header(header::HOST, host),
            None => builder,
        };
        match &self.session_cookie {
            Some(id) => builder.header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={id}")),
            None => builder,
        }
    }

    async fn send(&mut self, builder: axum::http::request::Builder) -> anyhow::Result<TestResponse> {
        let request = builder.body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

        let response = TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        self.store_cookie(&response);
        Ok(response)
    }

    fn store_cookie(&mut self, response: &TestResponse) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for cookie in response.set_cookies() {
            if let Some(rest) = cookie.strip_prefix(&prefix) {
                let value = rest.split(';').next().unwrap_or_default().trim();
                self.session_cookie = (!value.is_empty()).then(|| value.to_string());
            }
        }
    }
}
