use serde_json::Value;

/// Shown when neither the response body nor the transport error says anything useful.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred.";

/// Shown for a 401 whose body carries no message.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized – check your API token";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{}", .message.as_deref().unwrap_or(UNAUTHORIZED_MESSAGE))]
    Unauthorized { message: Option<String> },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// The one-line message surfaced in banners and error modals.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Other(_) => None,
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Preference order: a bare JSON string, then an `error` field, then a
/// `message` field, then the raw body when it is not JSON at all.
pub fn message_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => non_empty(s),
        Ok(Value::Object(map)) => ["error", "message"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .and_then(|s| non_empty(s.to_string()))
        }),
        Ok(_) => None,
        Err(_) => non_empty(body.to_string()),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
