use async_trait::async_trait;
use doctrips_core::auth::{
    cas_login_url, cas_validate_url, parse_service_response, AuthError, CasClient, CasIdentity,
    Result,
};
use url::Url;

/// CAS 2.0 server reached over HTTP.
pub struct CasServer {
    cas_url: String,
    http: reqwest::Client,
}

impl CasServer {
    pub fn new(cas_url: impl Into<String>) -> Self {
        Self {
            cas_url: cas_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CasClient for CasServer {
    fn login_url(&self, service: &str) -> Result<Url> {
        cas_login_url(&self.cas_url, service)
    }

    async fn validate_ticket(&self, ticket: &str, service: &str) -> Result<CasIdentity> {
        if ticket.is_empty() {
            return Err(AuthError::MissingTicket);
        }

        let url = cas_validate_url(&self.cas_url, ticket, service)?;
        tracing::debug!(url = %url, "Validating CAS ticket");

        let body = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .text()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        parse_service_response(&body)
    }
}
