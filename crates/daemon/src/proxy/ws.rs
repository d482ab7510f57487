// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket proxying: connect to the backend first, then upgrade the
//! client and bridge frames until either side closes or the link idles.

use std::time::Duration;

use axum::extract::ws::{CloseFrame as AxClose, Message as AxMsg, WebSocket, WebSocketUpgrade};
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use http::request::Parts;
use http::{HeaderName, StatusCode};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as TungClose;
use tokio_tungstenite::tungstenite::{Error as TungError, Message as TungMsg};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::forward::join_url;
use super::ProxyError;

type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Request headers carried over to the backend handshake.
const FORWARDED: &[&str] = &[
    "authorization",
    "cookie",
    "origin",
    "sec-websocket-protocol",
    "user-agent",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-proto",
];

#[derive(Debug, Clone, Copy)]
pub(super) struct WebSocketSettings {
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

/// Swaps `http`/`https` for `ws`/`wss`.
pub fn websocket_url(target: &Url) -> Result<Url, ProxyError> {
    let scheme = match target.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ProxyError::InvalidUri(format!("unsupported scheme {other}"))),
    };
    let mut url = target.clone();
    url.set_scheme(scheme).map_err(|()| ProxyError::InvalidUri(target.to_string()))?;
    Ok(url)
}

pub(super) async fn serve(
    settings: WebSocketSettings,
    parts: &mut Parts,
    target: &Url,
) -> Result<Response, ProxyError> {
    let upgrade = match WebSocketUpgrade::from_request_parts(parts, &()).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let url = websocket_url(&join_url(target, &parts.uri))?;
    let mut request = url.as_str().into_client_request().map_err(ws_error)?;
    for name in FORWARDED {
        let name = HeaderName::from_static(*name);
        for value in parts.headers.get_all(&name) {
            request.headers_mut().append(name.clone(), value.clone());
        }
    }

    let (backend, handshake) =
        match tokio::time::timeout(settings.connect_timeout, connect_async(request)).await {
            Err(_) => return Err(ProxyError::Timeout),
            Ok(Err(TungError::Http(resp))) if resp.status() == StatusCode::NOT_FOUND => {
                return Err(ProxyError::BackendNotFound)
            }
            Ok(Err(e)) => return Err(ws_error(e)),
            Ok(Ok(connected)) => connected,
        };

    let protocol = handshake
        .headers()
        .get(http::header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let upgrade = match protocol {
        Some(protocol) => upgrade.protocols([protocol]),
        None => upgrade,
    };

    tracing::debug!(backend = %url, "websocket connected to backend");
    Ok(upgrade
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "client websocket upgrade failed"))
        .on_upgrade(move |client| async move {
            bridge(client, backend, settings.idle_timeout).await;
        }))
}

fn ws_error(e: TungError) -> ProxyError {
    ProxyError::WebSocket(Box::new(e))
}

/// Why a bridge stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BridgeEnd {
    ClientClosed,
    BackendClosed,
    Idle,
}

pub(super) async fn bridge(client: WebSocket, backend: BackendSocket, idle: Duration) -> BridgeEnd {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut backend_tx, mut backend_rx) = backend.split();

    let idle_timer = tokio::time::sleep(idle);
    tokio::pin!(idle_timer);

    let end = loop {
        tokio::select! {
            msg = client_rx.next() => {
                let Some(Ok(msg)) = msg else { break BridgeEnd::ClientClosed };
                let closing = matches!(msg, AxMsg::Close(_));
                if backend_tx.send(to_backend(msg)).await.is_err() || closing {
                    break BridgeEnd::ClientClosed;
                }
            }
            msg = backend_rx.next() => {
                let Some(Ok(msg)) = msg else { break BridgeEnd::BackendClosed };
                let Some(msg) = to_client(msg) else { continue };
                let closing = matches!(msg, AxMsg::Close(_));
                if client_tx.send(msg).await.is_err() || closing {
                    break BridgeEnd::BackendClosed;
                }
            }
            () = &mut idle_timer => break BridgeEnd::Idle,
        }
        idle_timer.as_mut().reset(Instant::now() + idle);
    };

    let _ = backend_tx.close().await;
    let _ = client_tx.close().await;
    tracing::debug!(?end, "websocket bridge finished");
    end
}

fn to_backend(msg: AxMsg) -> TungMsg {
    match msg {
        AxMsg::Text(t) => TungMsg::text(t.as_str()),
        AxMsg::Binary(b) => TungMsg::Binary(b),
        AxMsg::Ping(p) => TungMsg::Ping(p),
        AxMsg::Pong(p) => TungMsg::Pong(p),
        AxMsg::Close(frame) => TungMsg::Close(frame.map(|f| TungClose {
            code: CloseCode::from(f.code),
            reason: f.reason.as_str().into(),
        })),
    }
}

fn to_client(msg: TungMsg) -> Option<AxMsg> {
    Some(match msg {
        TungMsg::Text(t) => AxMsg::Text(t.as_str().into()),
        TungMsg::Binary(b) => AxMsg::Binary(b),
        TungMsg::Ping(p) => AxMsg::Ping(p),
        TungMsg::Pong(p) => AxMsg::Pong(p),
        TungMsg::Close(frame) => AxMsg::Close(frame.map(|f| AxClose {
            code: u16::from(f.code),
            reason: f.reason.as_str().into(),
        })),
        TungMsg::Frame(_) => return None,
    })
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
