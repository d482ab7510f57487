// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner-token authentication for workspace and exposed-port requests.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderName, StatusCode};
use thiserror::Error;
use wsp_core::{WorkspaceCoords, WorkspaceInfo};

use crate::directory::Directory;
use crate::proxy::cookies::{find_cookie, owner_cookie_name};

pub const OWNER_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-gitpod-owner-token");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no owner token on request")]
    TokenNotFound,

    #[error("owner token does not match")]
    TokenMismatch,

    #[error("owner token is not correctly escaped")]
    TokenDecode,

    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::TokenNotFound => StatusCode::UNAUTHORIZED,
            AuthError::TokenMismatch => StatusCode::FORBIDDEN,
            AuthError::TokenDecode => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Outcome of checking a request against a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Owner,
    /// Unauthenticated, but the workspace or port admits everyone.
    Public,
    Denied(AuthError),
}

/// Decodes a query-escaped value; `+` becomes a space and every `%` must
/// start a valid two-digit hex escape.
pub fn query_unescape(raw: &str) -> Result<String, AuthError> {
    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let valid = bytes.get(i + 1..i + 3).is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(AuthError::TokenDecode);
        }
    }
    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AuthError::TokenDecode)
}

/// Reads the owner token from the header, else from the instance's owner cookie.
pub fn owner_token(headers: &HeaderMap, host_name: &str, info: &WorkspaceInfo) -> Result<String, AuthError> {
    if let Some(token) = headers.get(OWNER_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    let name = owner_cookie_name(host_name, info.instance_id.as_str());
    match find_cookie(headers, &name) {
        Some(value) => query_unescape(value),
        None => Err(AuthError::TokenNotFound),
    }
}

/// True when the workspace admits everyone or the addressed port is public.
pub fn is_public(info: &WorkspaceInfo, port: &str) -> bool {
    if info.auth.is_everyone() {
        return true;
    }
    !port.is_empty() && info.exposed_port(port).is_some_and(|p| p.is_public())
}

pub fn check(info: &WorkspaceInfo, port: &str, headers: &HeaderMap, host_name: &str) -> Access {
    let outcome = owner_token(headers, host_name, info).and_then(|token| {
        if info.auth.token_matches(token.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::TokenMismatch)
        }
    });
    match outcome {
        Ok(()) => Access::Owner,
        Err(_) if is_public(info, port) => Access::Public,
        Err(e) => Access::Denied(e),
    }
}

#[derive(Debug, Clone)]
pub struct AuthState {
    pub directory: Arc<Directory>,
    pub host_name: Arc<str>,
}

/// Middleware gating a request on the coordinates set by the router.
pub async fn require_owner(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    let Some(coords) = req.extensions().get::<WorkspaceCoords>().cloned() else {
        tracing::error!(uri = %req.uri(), "authenticating a request without workspace coordinates");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let Some(info) = state.directory.lookup(coords.id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match check(&info, &coords.port, req.headers(), &state.host_name) {
        Access::Owner => next.run(req).await,
        Access::Public => {
            let _guard = state.directory.acquire_access(&coords);
            next.run(req).await
        }
        Access::Denied(err) => {
            tracing::debug!(
                workspace_id = %coords.id,
                port = %coords.port,
                reason = %err,
                "rejecting unauthenticated request"
            );
            err.status().into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
