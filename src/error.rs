#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-success status outside the other categories. Counts as a network
    /// failure; `message` is the backend's explanation when it sent one.
    #[error("backend returned status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("upload rejected: {0}")]
    Auth(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("vlog {0} not found")]
    NotFound(String),
}

impl GatewayError {
    /// Message the backend attached to the failure, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            GatewayError::Auth(msg) | GatewayError::Validation(msg) if !msg.trim().is_empty() => {
                Some(msg.as_str())
            }
            GatewayError::Status {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => Some(msg.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_skips_transport_failures() {
        assert_eq!(GatewayError::Network("refused".into()).backend_message(), None);
        assert_eq!(
            GatewayError::Status { status: 503, message: None }.backend_message(),
            None
        );
        assert_eq!(
            GatewayError::Status {
                status: 500,
                message: Some("Storage quota exceeded".into())
            }
            .backend_message(),
            Some("Storage quota exceeded")
        );
        assert_eq!(GatewayError::Auth("  ".into()).backend_message(), None);
    }
}
