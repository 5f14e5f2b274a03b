//! Error types for the outreach pipeline.

/// Configuration-related errors. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Generative backend errors.
///
/// Neither variant is fatal: callers fall back to default values.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} unavailable: {reason}")]
    BackendUnavailable { provider: String, reason: String },

    #[error("Provider {provider} returned an error: {reason}")]
    BackendError { provider: String, reason: String },
}

impl LlmError {
    /// Map a reqwest failure onto the backend taxonomy.
    ///
    /// Connect failures and timeouts mean the backend is unreachable;
    /// everything else (status, decode) is a backend error.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::BackendUnavailable {
                provider: provider.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::BackendError {
                provider: provider.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Mail delivery and inbox errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("{0}")]
    SendFailed(String),

    #[error("Inbox fetch failed: {0}")]
    InboxFetch(String),
}

/// Lead table, output table, and report I/O errors. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message template errors.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_failed_displays_bare_cause() {
        let err = TransportError::SendFailed("connection refused".into());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn config_error_names_the_key() {
        let err = ConfigError::InvalidValue {
            key: "LLM_PROVIDER".into(),
            message: "unsupported provider 'foo'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for LLM_PROVIDER: unsupported provider 'foo'"
        );
    }

    #[test]
    fn csv_error_names_the_file() {
        let source = csv::ReaderBuilder::new()
            .from_reader("a,b\n1,2,3\n".as_bytes())
            .records()
            .find_map(|r| r.err())
            .unwrap();
        let err = StoreError::Csv {
            path: "/data/leads.csv".into(),
            source,
        };
        assert!(err.to_string().starts_with("CSV error in /data/leads.csv:"));
    }
}
