//! HTTP handlers for the auth actions.
//!
//! Every handler loads the session named by the request cookie (or starts a
//! new one), runs one controller action, then writes the session back once.
//! When login adopts the provider's session id the stored record is moved
//! to the new id and a fresh cookie is issued.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ssp_auth::AuthResult;
use ssp_session::SessionState;

use crate::controller::{ActionParams, ActionResponse, RequestContext};
use crate::cookies::{self, PROVIDER_TOKEN_COOKIE_NAME, SESSION_COOKIE_NAME};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// A session loaded for the duration of one request.
#[derive(Debug)]
pub struct RequestSession {
    /// The session state.
    pub session: SessionState,
    /// Id the session was stored under when the request arrived.
    original_id: Option<String>,
}

/// Loads the session named by the request cookie, or starts a new one.
///
/// ## Errors
///
/// Returns an error if the session store fails.
pub async fn load_session(state: &AppState, headers: &HeaderMap) -> ServerResult<RequestSession> {
    if let Some(id) = cookies::extract_session_id(headers) {
        if let Some(session) = state.sessions.load(&id).await? {
            return Ok(RequestSession {
                session,
                original_id: Some(id),
            });
        }
        tracing::debug!(session_id = %id, "Unknown session cookie, starting a new session");
    }
    Ok(RequestSession {
        session: SessionState::new(),
        original_id: None,
    })
}

/// Writes the session back and returns the cookies to set.
///
/// With `end_session` the record is deleted instead and both the session
/// cookie and the provider's token cookie are expired.
///
/// ## Errors
///
/// Returns an error if the session store fails.
pub async fn persist_session(
    state: &AppState,
    request_session: &mut RequestSession,
    end_session: bool,
) -> ServerResult<Vec<String>> {
    let secure = state.config.secure_cookies;
    let session = &mut request_session.session;

    if end_session {
        if let Some(original) = &request_session.original_id {
            state.sessions.delete(original).await?;
        }
        state.sessions.delete(&session.id).await?;
        return Ok(vec![
            cookies::expire_cookie(SESSION_COOKIE_NAME, secure),
            cookies::expire_cookie(PROVIDER_TOKEN_COOKIE_NAME, secure),
        ]);
    }

    if let Some(original) = request_session.original_id.as_deref() {
        if original != session.id {
            match state.sessions.rename(original, &session.id).await {
                Err(err) if err.is_not_found() => {}
                other => other?,
            }
            tracing::debug!(from = %original, to = %session.id, "Session id changed");
        }
    }

    session.touch();
    state.sessions.save(session).await?;

    if request_session.original_id.as_deref() == Some(session.id.as_str()) {
        Ok(Vec::new())
    } else {
        request_session.original_id = Some(session.id.clone());
        Ok(vec![cookies::create_session_cookie(&session.id, secure)])
    }
}

/// Persists the session and turns an action result into a response.
pub async fn complete(
    state: &AppState,
    mut request_session: RequestSession,
    result: AuthResult<ActionResponse>,
) -> Response {
    let end_session = matches!(result, Ok(ActionResponse::EndSession { .. }));
    let cookies = match persist_session(state, &mut request_session, end_session).await {
        Ok(cookies) => cookies,
        Err(err) => return err.into_response(),
    };

    let mut response = match result {
        Ok(action) => action_response(action),
        Err(err) => ServerError::from(err).into_response(),
    };
    for cookie in &cookies {
        cookies::append_cookie(response.headers_mut(), cookie);
    }
    response
}

fn action_response(action: ActionResponse) -> Response {
    match action {
        ActionResponse::Redirect(location) | ActionResponse::EndSession { location } => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        ActionResponse::Text(body) => body.into_response(),
        ActionResponse::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        ActionResponse::Continue => StatusCode::NO_CONTENT.into_response(),
    }
}

/// `GET /Security`
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> ServerResult<Response> {
    let ctx = RequestContext::from_http(&headers, &uri);
    let mut request_session = load_session(&state, &headers).await?;
    let result = state
        .controller
        .index(&mut request_session.session, &ctx)
        .await;
    Ok(complete(&state, request_session, result).await)
}

/// `GET /Security/login`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<ActionParams>,
) -> ServerResult<Response> {
    let ctx = RequestContext::from_http(&headers, &uri);
    let mut request_session = load_session(&state, &headers).await?;
    let result = state
        .controller
        .login(&mut request_session.session, &ctx, &params)
        .await;
    Ok(complete(&state, request_session, result).await)
}

/// `GET /Security/logout`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<ActionParams>,
) -> ServerResult<Response> {
    let ctx = RequestContext::from_http(&headers, &uri);
    let mut request_session = load_session(&state, &headers).await?;
    let result = state
        .controller
        .logout(&mut request_session.session, &ctx, &params)
        .await;
    Ok(complete(&state, request_session, result).await)
}

/// `GET /Security/loggedout`
pub async fn logged_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> ServerResult<Response> {
    let ctx = RequestContext::from_http(&headers, &uri);
    let mut request_session = load_session(&state, &headers).await?;
    let result = state
        .controller
        .logged_out(&mut request_session.session, &ctx)
        .await;
    Ok(complete(&state, request_session, result).await)
}

/// `GET /Security/LoginForm`
pub async fn login_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> ServerResult<Response> {
    let ctx = RequestContext::from_http(&headers, &uri);
    let mut request_session = load_session(&state, &headers).await?;
    let result = state
        .controller
        .login_form(&mut request_session.session, &ctx)
        .await;
    Ok(complete(&state, request_session, result).await)
}

/// `GET /Security/ping`
///
/// Answers without loading a session.
pub async fn ping(State(state): State<AppState>) -> Response {
    action_response(state.controller.ping())
}

/// Attempts a silent login before host pages are served.
///
/// Only `GET` and `HEAD` requests are considered, since redirecting any
/// other method would lose its body.
pub async fn passive_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method();
    if *method != Method::GET && *method != Method::HEAD {
        return next.run(request).await;
    }

    let ctx = RequestContext::from_http(request.headers(), request.uri());
    let mut request_session = match load_session(&state, request.headers()).await {
        Ok(request_session) => request_session,
        Err(err) => return err.into_response(),
    };

    match state
        .controller
        .passive_login(&mut request_session.session, &ctx)
        .await
    {
        Ok(ActionResponse::Continue) => {
            let cookies = match persist_session(&state, &mut request_session, false).await {
                Ok(cookies) => cookies,
                Err(err) => return err.into_response(),
            };
            let mut response = next.run(request).await;
            for cookie in &cookies {
                cookies::append_cookie(response.headers_mut(), cookie);
            }
            response
        }
        result => complete(&state, request_session, result).await,
    }
}
