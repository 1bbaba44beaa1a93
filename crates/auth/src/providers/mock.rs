//! Mock CAS client for development and testing.
//!
//! Login is sent to the in-app mock page (`/auth/mock/login`), which mints
//! tickets that are base64-encoded JSON `{"netid", "name"}`. Any other
//! non-empty ticket is taken to be the netid itself.

use async_trait::async_trait;
use base64::Engine;
use doctrips_core::auth::{AuthError, CasClient, CasIdentity, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MockTicket {
    pub netid: String,
    pub name: Option<String>,
}

impl MockTicket {
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    fn decode(ticket: &str) -> Option<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(ticket)
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

pub struct MockCas {
    base_url: Url,
}

impl MockCas {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl CasClient for MockCas {
    fn login_url(&self, service: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("/auth/mock/login")
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        url.query_pairs_mut().append_pair("service", service);
        Ok(url)
    }

    async fn validate_ticket(&self, ticket: &str, _service: &str) -> Result<CasIdentity> {
        let ticket = ticket.trim();
        if ticket.is_empty() {
            return Err(AuthError::MissingTicket);
        }

        let identity = match MockTicket::decode(ticket) {
            Some(MockTicket { netid, name }) if !netid.trim().is_empty() => CasIdentity {
                netid: netid.trim().to_string(),
                name: name.filter(|n| !n.trim().is_empty()),
            },
            _ => CasIdentity {
                netid: ticket.to_string(),
                name: None,
            },
        };
        Ok(identity)
    }
}
