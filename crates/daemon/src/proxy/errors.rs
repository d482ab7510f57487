// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy and target-resolution errors, and transport failure classification.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Failure to compute a backend URL. Indicates a routing or config bug.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no workspace coordinates on request")]
    MissingCoords,

    #[error("no workspace info available for {0}")]
    MissingWorkspace(String),

    #[error("no image to serve from the blob server")]
    MissingImage,

    #[error("invalid target URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid request path: {0}")]
    Path(String),
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Backend answered 404; treated as a transport failure.
    #[error("backend returned 404")]
    BackendNotFound,

    #[error("invalid backend URI: {0}")]
    InvalidUri(String),

    #[error("backend request failed: {0}")]
    Transport(#[source] hyper_util::client::legacy::Error),

    #[error("websocket connection to backend failed: {0}")]
    WebSocket(#[source] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("backend connection timed out")]
    Timeout,

    #[error("blob server error ({status}): {body}")]
    BlobServer { status: http::StatusCode, body: String },

    #[error("reading request body: {0}")]
    Body(String),
}

/// Coarse cause of a transport failure, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Timeout,
    UnknownHost,
    ConnectionRefused,
    ConnectionReset,
    Other,
}

wsp_core::simple_display! {
    ErrorClass {
        Timeout => "timeout",
        UnknownHost => "unknown host",
        ConnectionRefused => "connection refused",
        ConnectionReset => "connection reset",
        Other => "other",
    }
}

impl ProxyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProxyError::Timeout => ErrorClass::Timeout,
            other => classify(other),
        }
    }
}

/// Walks the source chain looking for a recognisable I/O or DNS failure.
pub fn classify(err: &(dyn StdError + 'static)) -> ErrorClass {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<io::Error>() {
            match io.kind() {
                io::ErrorKind::TimedOut => return ErrorClass::Timeout,
                io::ErrorKind::ConnectionRefused => return ErrorClass::ConnectionRefused,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe => return ErrorClass::ConnectionReset,
                _ => {}
            }
        }
        if e.is::<tokio::time::error::Elapsed>() {
            return ErrorClass::Timeout;
        }
        let msg = e.to_string();
        if msg.contains("dns error")
            || msg.contains("lookup address")
            || msg.contains("Name or service not known")
        {
            return ErrorClass::UnknownHost;
        }
        current = e.source();
    }
    ErrorClass::Other
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
