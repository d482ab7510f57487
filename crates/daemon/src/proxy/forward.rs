// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request rewriting for the standard reverse proxy.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use http::header::{CONNECTION, UPGRADE};
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Uri, Version};
use url::Url;

use super::ProxyError;

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// True for `Connection: upgrade` plus `Upgrade: websocket`, case-insensitive.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    let upgrade_websocket = headers
        .get_all(UPGRADE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.trim().eq_ignore_ascii_case("websocket"));
    connection_upgrade && upgrade_websocket
}

/// Removes hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Joins the request path and query onto the target base URL.
pub fn join_url(target: &Url, uri: &Uri) -> Url {
    let mut joined = target.clone();
    joined.set_path(&join_path(target.path(), uri.path()));
    let query = match (target.query().filter(|q| !q.is_empty()), uri.query()) {
        (Some(base), Some(extra)) if !extra.is_empty() => Some(format!("{base}&{extra}")),
        (Some(base), _) => Some(base.to_string()),
        (None, extra) => extra.filter(|q| !q.is_empty()).map(str::to_string),
    };
    joined.set_query(query.as_deref());
    joined
}

/// Points the request at the backend and prepares it for forwarding.
pub(super) fn rewrite(parts: &mut Parts, target: &Url) -> Result<(), ProxyError> {
    let url = join_url(target, &parts.uri);
    parts.uri = url.as_str().parse::<Uri>().map_err(|e| ProxyError::InvalidUri(e.to_string()))?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        append_forwarded_for(&mut parts.headers, addr.ip().to_string());
    }
    Ok(())
}

fn append_forwarded_for(headers: &mut HeaderMap, client: String) {
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {client}"),
        None => client,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
