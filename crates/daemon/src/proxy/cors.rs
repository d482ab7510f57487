// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CORS policies for workspace and static-asset routes.

use std::time::Duration;

use http::header::{
    AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, DNT, IF_MODIFIED_SINCE, ORIGIN, USER_AGENT,
};
use http::{HeaderName, HeaderValue, Method};
use regex::Regex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::GitpodInstallation;

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Origins allowed on workspace routes: the installation host and its subdomains.
pub fn origin_pattern(host_name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^[a-zA-Z][a-zA-Z0-9+.-]*://([^/]*\.)?{}(:\d+)?$", regex::escape(host_name)))
}

/// Credentialed CORS for IDE and supervisor routes.
pub fn workspace_cors(installation: &GitpodInstallation) -> Result<CorsLayer, regex::Error> {
    let pattern = origin_pattern(&installation.host_name)?;
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin.to_str().is_ok_and(|origin| pattern.is_match(origin))
    });

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CACHE_CONTROL,
            CONTENT_TYPE,
            DNT,
            IF_MODIFIED_SINCE,
            KEEP_ALIVE,
            ORIGIN,
            USER_AGENT,
            X_REQUESTED_WITH,
        ])
        .allow_credentials(true)
        .expose_headers([AUTHORIZATION])
        .max_age(Duration::from_secs(60)))
}

/// Anonymous CORS for static assets.
pub fn blobserve_cors() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::OPTIONS])
}

#[cfg(test)]
#[path = "cors_tests.rs"]
mod tests;
