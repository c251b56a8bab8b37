//! Caller identity from the fronting auth proxy.
//!
//! The proxy forwards the social session as plain headers. Each one is
//! optional; a request without them is anonymous, never rejected.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::convert::Infallible;

use crate::types::SocialIdentity;

pub const USER_ID_HEADER: &str = "x-social-user-id";
pub const HANDLE_HEADER: &str = "x-social-handle";
pub const AVATAR_HEADER: &str = "x-social-avatar";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn identity_from_headers(headers: &HeaderMap) -> SocialIdentity {
    SocialIdentity {
        user_id: header(headers, USER_ID_HEADER),
        handle: header(headers, HANDLE_HEADER).map(|h| h.trim_start_matches('@').to_string()),
        raw_avatar_url: header(headers, AVATAR_HEADER),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SocialIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(identity_from_headers(&parts.headers))
    }
}
