// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP snapshot + WebSocket subscription client.
//!
//! `GET <addr>/workspaces` returns a [`GetWorkspacesResponse`]; the
//! subscription is a WebSocket at `<addr>/subscribe` carrying one JSON
//! [`SubscribeEvent`] per message.

use async_trait::async_trait;
use axum::body::Body;
use futures_util::StreamExt;
use http_body_util::BodyExt;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wsp_wire::{GetWorkspacesResponse, SubscribeEvent, WorkspaceStatus};

use super::{EventStream, Orchestrator, OrchestratorError};
use crate::proxy::HttpClient;

pub struct RemoteOrchestrator {
    base: Url,
    client: HttpClient,
}

impl RemoteOrchestrator {
    pub fn new(base: Url, client: HttpClient) -> Self {
        Self { base, client }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    fn subscribe_url(&self) -> Result<Url, OrchestratorError> {
        let mut url = self.endpoint("subscribe");
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| OrchestratorError::Connect(format!("cannot use {url} as websocket URL")))?;
        Ok(url)
    }
}

#[async_trait]
impl Orchestrator for RemoteOrchestrator {
    async fn get_workspaces(&self) -> Result<Vec<WorkspaceStatus>, OrchestratorError> {
        let url = self.endpoint("workspaces");
        let request = http::Request::get(url.as_str())
            .header(http::header::ACCEPT, "application/json")
            .body(Body::empty())
            .map_err(|e| OrchestratorError::Connect(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| OrchestratorError::Connect(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OrchestratorError::Status(response.status()));
        }
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| OrchestratorError::Stream(e.to_string()))?
            .to_bytes();
        let snapshot: GetWorkspacesResponse = wsp_wire::decode(&bytes)?;
        Ok(snapshot.status)
    }

    async fn subscribe(&self) -> Result<EventStream, OrchestratorError> {
        let url = self.subscribe_url()?;
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| OrchestratorError::Connect(format!("{url}: {e}")))?;
        tracing::info!(%url, "subscribed to orchestrator");

        let events = socket
            .take_while(|msg| std::future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| async move {
                match msg {
                    Ok(Message::Text(text)) => {
                        Some(wsp_wire::decode::<SubscribeEvent>(text.as_bytes()).map_err(Into::into))
                    }
                    Ok(Message::Binary(data)) => {
                        Some(wsp_wire::decode::<SubscribeEvent>(&data).map_err(Into::into))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(OrchestratorError::Stream(e.to_string()))),
                }
            });
        Ok(events.boxed())
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
