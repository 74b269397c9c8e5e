use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Sign in to do that")]
    NotSignedIn,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Map a non-success response to an error, keeping the server's message
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        match status {
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            _ => Self::Api { status, message },
        }
    }

    /// Text stored in a slice's `error` field. Server messages pass through
    /// verbatim; transport failures fall back to the per-action message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } | Self::NotFound(message) | Self::Forbidden(message) => {
                message.clone()
            }
            Self::Validation(msg) => msg.clone(),
            Self::NotSignedIn | Self::SessionExpired => self.to_string(),
            Self::Transport(_) | Self::Json(_) | Self::Url(_) => {
                tracing::error!("{}: {}", fallback, self);
                fallback.to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
