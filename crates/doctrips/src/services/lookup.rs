//! Netid and email lookup against the college directory.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Email lookup failed: NetId {0} not found")]
    NetIdNotFound(String),
    #[error("Email lookup failed: NetId mismatch: {found} != {expected}")]
    Mismatch { found: String, expected: String },
    #[error("Directory request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Http(e.to_string())
    }
}

/// The directory services used when creating users.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Searches DartDm; the JSON answer is passed through untouched.
    async fn search(&self, term: &str) -> Result<Value, LookupError>;

    /// Resolves the email address of a netid.
    async fn lookup_email(&self, netid: &str) -> Result<String, LookupError>;
}

#[derive(Debug, Deserialize)]
struct Profile {
    netid: String,
    email: String,
}

/// Checks a profile answer. `{}` and `null` mean the netid is unknown.
fn email_from_profile(netid: &str, body: Value) -> Result<String, LookupError> {
    let empty = match &body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        tracing::error!(netid, "Email lookup failed: netid not found");
        return Err(LookupError::NetIdNotFound(netid.to_string()));
    }

    let profile: Profile =
        serde_json::from_value(body).map_err(|e| LookupError::Http(e.to_string()))?;
    if profile.netid != netid {
        return Err(LookupError::Mismatch {
            found: profile.netid,
            expected: netid.to_string(),
        });
    }
    Ok(profile.email)
}

/// DartDm and the profile service over HTTP.
pub struct DartmouthDirectory {
    http: reqwest::Client,
    dartdm_url: String,
    dndprofiles_url: String,
}

impl DartmouthDirectory {
    pub fn new(dartdm_url: impl Into<String>, dndprofiles_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            dartdm_url: dartdm_url.into(),
            dndprofiles_url: dndprofiles_url.into(),
        }
    }
}

#[async_trait]
impl Directory for DartmouthDirectory {
    async fn search(&self, term: &str) -> Result<Value, LookupError> {
        tracing::debug!(term, "Searching DartDm");
        Ok(self
            .http
            .get(&self.dartdm_url)
            .query(&[("term", term)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn lookup_email(&self, netid: &str) -> Result<String, LookupError> {
        let body: Value = self
            .http
            .get(&self.dndprofiles_url)
            .query(&[("lookup", netid), ("fields", "email"), ("fields", "netid")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        email_from_profile(netid, body)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Directory answering from a fixed list of `(netid, name, email)`.
    pub struct FakeDirectory(pub Vec<(&'static str, &'static str, &'static str)>);

    #[async_trait]
    impl Directory for FakeDirectory {
        async fn search(&self, term: &str) -> Result<Value, LookupError> {
            let term = term.to_lowercase();
            Ok(Value::Array(
                self.0
                    .iter()
                    .filter(|(netid, name, _)| {
                        netid.contains(&term) || name.to_lowercase().contains(&term)
                    })
                    .map(|(netid, name, _)| serde_json::json!({"netid": netid, "name": name}))
                    .collect(),
            ))
        }

        async fn lookup_email(&self, netid: &str) -> Result<String, LookupError> {
            self.0
                .iter()
                .find(|(n, _, _)| *n == netid)
                .map(|(_, _, email)| email.to_string())
                .ok_or_else(|| LookupError::NetIdNotFound(netid.to_string()))
        }
    }
}
