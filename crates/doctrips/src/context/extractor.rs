//! Axum extractor for RequestContext.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use doctrips_auth::{AuthState, OptionalUser};
use uuid::Uuid;

use super::types::{RequestContext, RequestId};

fn extract_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(RequestId::from_uuid)
        .unwrap_or_else(RequestId::new)
}

impl<S> FromRequestParts<S> for RequestContext
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalUser(None));

        Ok(RequestContext {
            user,
            request_id: extract_request_id(&parts.headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_request_id_from_header() {
        let mut headers = HeaderMap::new();
        let id = "550e8400-e29b-41d4-a716-446655440000";
        headers.insert("x-request-id", id.parse().unwrap());

        assert_eq!(extract_request_id(&headers).to_string(), id);
    }

    #[test]
    fn test_extract_request_id_generates_when_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "not-a-uuid".parse().unwrap());

        let request_id = extract_request_id(&headers);
        Uuid::parse_str(&request_id.to_string()).expect("Should be valid UUID");
    }
}
