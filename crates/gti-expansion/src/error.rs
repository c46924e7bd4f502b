//! Error types for the expansion module

use thiserror::Error;

/// Expansion module error type
///
/// Every variant is rendered as `{"error": <message>}` by the entry point, so
/// the `Display` text is what the MISP user ends up reading.
#[derive(Error, Debug)]
pub enum ExpansionError {
    /// Missing API key, incomplete proxy settings, bad limits
    #[error("{0}")]
    Configuration(String),

    /// Missing attribute or unsupported attribute type
    #[error("{0}")]
    Input(String),

    /// Lookup rejected by the API (not found, auth failure, quota)
    #[error("{message}")]
    Api { code: String, message: String },

    /// Transport or decoding failure talking to the API
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

impl ExpansionError {
    pub(crate) fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// True for failures raised before any lookup was attempted
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Input(_))
    }
}

/// Result type for the expansion module
pub type Result<T> = std::result::Result<T, ExpansionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        let err = ExpansionError::api("NotFoundError", "Resource not found.");
        assert_eq!(err.to_string(), "Resource not found.");

        let err = ExpansionError::Input("Unsupported attribute type.".into());
        assert_eq!(err.to_string(), "Unsupported attribute type.");
        assert!(err.is_request_error());
    }
}
