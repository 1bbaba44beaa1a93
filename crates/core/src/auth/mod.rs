mod cas;
mod error;
mod functions;
mod traits;
mod types;
mod validation;

pub use cas::{cas_login_url, cas_validate_url, parse_service_response};
pub use error::AuthError;
pub use functions::{calculate_expiry, generate_session_id, is_session_expired};
pub use traits::{CasClient, Result, SessionRepository};
pub use types::{CasIdentity, Session, SessionId};
pub use validation::validate_return_to;
