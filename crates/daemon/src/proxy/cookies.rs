// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform cookie naming and filtering.
//!
//! Platform cookies are prefixed with `_<host>_`, where the installation
//! host has spaces, dashes and dots replaced by underscores.

use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};

/// Replaces ` `, `-` and `.` with `_`.
pub fn sanitize(value: &str) -> String {
    value.replace([' ', '-', '.'], "_")
}

/// `_<sanitized host>_`; also the exact name of the session cookie.
pub fn cookie_prefix(host: &str) -> String {
    format!("_{}_", sanitize(host))
}

/// Name of the cookie holding the owner token of one instance.
///
/// Only the host is sanitized; the instance ID keeps its dashes.
pub fn owner_cookie_name(host: &str, instance_id: &str) -> String {
    format!("{}ws_{instance_id}_owner_", cookie_prefix(host))
}

fn is_sensitive(name: &str, prefix: &str) -> bool {
    if name.eq_ignore_ascii_case(prefix) {
        return true;
    }
    name.starts_with(prefix) && (name.ends_with("_port_auth_") || name.ends_with("_owner_"))
}

/// Drops the session, port-auth and owner cookies from a `Cookie` header value.
pub fn remove_sensitive_cookies(header: &str, host: &str) -> String {
    let prefix = cookie_prefix(host);
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let name = pair.split_once('=').map_or(*pair, |(name, _)| name).trim();
            !is_sensitive(name, &prefix)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rewrites all `Cookie` headers into one filtered header, or none if nothing is left.
pub fn strip_sensitive_cookies(headers: &mut HeaderMap, host: &str) {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    headers.remove(COOKIE);

    let filtered = remove_sensitive_cookies(&joined, host);
    if filtered.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&filtered) {
        headers.insert(COOKIE, value);
    }
}

/// Value of the named cookie, taken from any `Cookie` header.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(n, _)| n.trim() == name)
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
#[path = "cookies_tests.rs"]
mod tests;
