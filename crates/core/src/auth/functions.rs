use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

use super::{Session, SessionId};

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

pub fn is_session_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Session {
        Session {
            id: generate_session_id(),
            user_id: Uuid::new_v4(),
            netid: "d12345a".to_string(),
            created_at,
            expires_at,
        }
    }

    #[test]
    fn generate_session_id_produces_32_char_alphanumeric() {
        let id = generate_session_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_session_id());
    }

    #[test]
    fn session_with_future_expiry_is_live() {
        let now = Utc::now();
        assert!(!is_session_expired(&session(now, now + Duration::hours(1)), now));
    }

    #[test]
    fn session_expires_at_exact_expiry() {
        let now = Utc::now();
        assert!(is_session_expired(&session(now - Duration::hours(1), now), now));
        assert!(is_session_expired(
            &session(now - Duration::hours(2), now - Duration::hours(1)),
            now
        ));
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        let ttl = Duration::hours(24);
        assert_eq!(calculate_expiry(created, ttl), created + ttl);
    }
}
