//! Estrazione di token di sessione e identificativo client dagli header

use axum::http::{header, HeaderMap};
use std::net::SocketAddr;

use crate::config::paths::SESSION_COOKIE;

/// Caratteri del credential usati come identificativo per il rate limiting
const TOKEN_FRAGMENT_LEN: usize = 16;

/// Identificativo quando non si sa nulla del client
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Token di sessione: cookie `sq_session`, altrimenti Authorization Bearer
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string());

    let from_bearer = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
    };

    from_cookie.or_else(from_bearer).filter(|t| !t.is_empty())
}

/// Identificativo del client per il rate limiting.
///
/// Euristica best-effort, NON un confine di sicurezza: il frammento di token
/// e gli header forwarded sono falsificabili dal client.
///
/// Ordine: ultimi caratteri del credential in Authorization, primo
/// indirizzo di `X-Forwarded-For`, `X-Real-IP`, indirizzo della connessione,
/// infine `"unknown"`.
pub fn client_identifier(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    if let Some(credential) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
    {
        let chars: Vec<char> = credential.chars().collect();
        let start = chars.len().saturating_sub(TOKEN_FRAGMENT_LEN);
        let fragment: String = chars[start..].iter().collect();
        return format!("token:{}", fragment);
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
