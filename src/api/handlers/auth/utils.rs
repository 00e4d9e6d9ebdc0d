//! Request helpers: client identity, session cookie and bearer token handling.

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, COOKIE, USER_AGENT},
    HeaderMap, HeaderValue,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::auth::models::ClientInfo;

pub const SESSION_COOKIE_NAME: &str = "fleetpass_session";

// Two weeks.
const SESSION_COOKIE_MAX_AGE_SECONDS: u32 = 14 * 24 * 60 * 60;

/// Resolve the caller's IP: proxy headers first, then the TCP peer.
///
/// Unparseable header values fall through to the next source; when nothing
/// usable is present the unspecified address is returned.
pub(crate) fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return ip;
    }
    peer.map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip())
}

pub(crate) fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    ClientInfo::new(extract_client_ip(headers, peer), user_agent)
}

/// Transport session key from the `Cookie` header.
pub(crate) fn extract_session_key(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Create a new random session key for the transport cookie.
pub(crate) fn generate_session_key() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session key")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Build an `HttpOnly` cookie carrying the session key.
pub(crate) fn session_cookie(key: &str, secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={key}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_COOKIE_MAX_AGE_SECONDS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("invalid session cookie")
}

pub(crate) fn clear_session_cookie(secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("invalid session cookie")
}
