// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket upgrades are tunnelled to the workspace.

use crate::prelude::*;
use futures_util::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

async fn setup() -> (FakeManager, Gateway) {
    let backend = echo_backend().await;
    let manager = FakeManager::start(vec![running(WORKSPACE_ID, INSTANCE_ID, vec![])]).await;
    let gateway = Gateway::start(&manager, backend).await;
    (manager, gateway)
}

fn upgrade(gateway: &Gateway, cookie: Option<&str>) -> http::Request<()> {
    let mut req = gateway.ws_url("/ws").into_client_request().unwrap();
    let headers = req.headers_mut();
    headers.insert(HOST, HeaderValue::from_str(&workspace_host(WORKSPACE_ID)).unwrap());
    if let Some(cookie) = cookie {
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
    }
    req
}

#[tokio::test]
async fn owner_websocket_is_echoed_by_the_workspace() {
    let (_manager, gateway) = setup().await;
    let cookie = owner_cookie();

    let (mut socket, resp) =
        tokio_tungstenite::connect_async(upgrade(&gateway, Some(&cookie))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SWITCHING_PROTOCOLS);

    socket.send(Message::Text("ping".into())).await.unwrap();
    let echoed = socket.next().await.unwrap().unwrap();
    assert_eq!(echoed.into_text().unwrap().as_str(), "ping");

    socket.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
    let echoed = socket.next().await.unwrap().unwrap();
    assert_eq!(echoed.into_data().as_ref(), &[1u8, 2, 3]);
}

#[tokio::test]
async fn anonymous_websocket_is_refused() {
    let (_manager, gateway) = setup().await;

    let err = tokio_tungstenite::connect_async(upgrade(&gateway, None)).await.unwrap_err();

    match err {
        WsError::Http(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
        other => panic!("expected an HTTP rejection, got {other}"),
    }
}
