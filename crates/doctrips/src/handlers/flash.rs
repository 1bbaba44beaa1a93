//! Flash messages carried in a short-lived cookie.
//!
//! The client shows the message once and clears it. Deletes and portal
//! redirects use them to report what happened.

use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

/// Flash message structure stored in cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessage {
    /// Message type: "error", "success" or "info"
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
    /// Whether the message should auto-dismiss after a few seconds
    pub auto_dismiss: bool,
}

impl FlashMessage {
    /// An error that requires manual dismissal.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message_type: "error".to_string(),
            message: message.into(),
            auto_dismiss: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message_type: "success".to_string(),
            message: message.into(),
            auto_dismiss: true,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message_type: "info".to_string(),
            message: message.into(),
            auto_dismiss: true,
        }
    }

    /// Serialize to JSON for cookie storage.
    pub fn to_cookie_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Set-Cookie value: `Path=/`, `SameSite=Lax`, `Max-Age=60`, readable by scripts.
    pub fn to_set_cookie_header(&self) -> String {
        let encoded = urlencoding::encode(&self.to_cookie_value()).into_owned();
        format!("flash_message={encoded}; Path=/; SameSite=Lax; Max-Age=60")
    }
}

/// Create a redirect response with a flash message cookie.
pub fn redirect_with_flash(url: &str, flash: FlashMessage) -> Response {
    ([(SET_COOKIE, flash.to_set_cookie_header())], Redirect::to(url)).into_response()
}

/// Attach a flash message cookie to any response.
pub fn with_flash(response: impl IntoResponse, flash: FlashMessage) -> Response {
    ([(SET_COOKIE, flash.to_set_cookie_header())], response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_flash_message() {
        let flash = FlashMessage::error("Access denied");
        assert_eq!(flash.message_type, "error");
        assert!(!flash.auto_dismiss);
    }

    #[test]
    fn test_to_cookie_value() {
        let json = FlashMessage::success("Saved").to_cookie_value();
        assert!(json.contains("\"type\":\"success\""));
        assert!(json.contains("\"autoDismiss\":true"));
    }

    #[test]
    fn test_to_set_cookie_header() {
        let header = FlashMessage::info("You have already applied").to_set_cookie_header();
        assert!(header.starts_with("flash_message=%7B"));
        assert!(header.ends_with("; Path=/; SameSite=Lax; Max-Age=60"));
    }

    #[test]
    fn test_redirect_with_flash() {
        let response = redirect_with_flash("/apply/continue", FlashMessage::info("hi"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().contains_key(SET_COOKIE));
    }
}
