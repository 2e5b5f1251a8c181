/**
 * Handshake Authentication
 *
 * Extracts the bearer credential from a WebSocket upgrade request and
 * verifies it before the transport is upgraded.
 *
 * # Credential Sources
 *
 * Checked in order, first match wins:
 * 1. Session cookie (name from `GatewayConfig::session_cookie`)
 * 2. `token` query parameter, unless disabled by `allow_query_token`;
 *    weaker since URLs end up in proxy logs, but browsers cannot set
 *    headers on a WebSocket connect
 * 3. `Authorization: Bearer <token>` header
 */

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::{GatewayConfig, SubjectId};
use axum::extract::{FromRequestParts, Query};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Deserialize;

/// Where a credential was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    Query,
    Header,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Find the bearer credential in an upgrade request
pub fn extract_credential(parts: &Parts, config: &GatewayConfig) -> Option<(String, CredentialSource)> {
    if let Some(token) = cookie_value(&parts.headers, &config.session_cookie) {
        return Some((token, CredentialSource::Cookie));
    }

    if config.allow_query_token {
        if let Ok(Query(TokenQuery { token: Some(token) })) = Query::<TokenQuery>::try_from_uri(&parts.uri) {
            if !token.is_empty() {
                return Some((token, CredentialSource::Query));
            }
        }
    }

    bearer_token(&parts.headers).map(|token| (token, CredentialSource::Header))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Subject verified from the upgrade request's credential
///
/// Rejects with `401 Unauthorized` before any connection state exists.
#[derive(Debug, Clone, Copy)]
pub struct AuthSubject(pub SubjectId);

impl FromRequestParts<AppState> for AuthSubject {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (token, source) = extract_credential(parts, &state.config)
            .ok_or_else(|| BackendError::unauthorized("missing credential"))?;

        let subject = state
            .verifier
            .verify(&token)
            .map_err(|e| BackendError::unauthorized(format!("{} ({:?})", e, source)))?;

        tracing::debug!(subject = %subject, ?source, "handshake credential verified");
        Ok(AuthSubject(subject))
    }
}
