//! Campaign configuration.
//!
//! Built once at startup and passed by reference into each component.
//! Nothing downstream reads the process environment.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default inbox endpoint (MailHog v2 API).
pub const DEFAULT_MAILHOG_API: &str = "http://mailhog:8025/api/v2/messages";

/// SMTP settings for outbound delivery.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Login user. Empty together with an empty password means anonymous relay.
    pub username: String,
    pub password: SecretString,
    pub from_name: String,
    pub from_address: String,
}

/// Immutable configuration for a single campaign run.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub llm: LlmConfig,
    pub smtp: SmtpConfig,
    pub leads_csv: PathBuf,
    pub output_csv: PathBuf,
    pub reports_dir: PathBuf,
    pub mailhog_api: String,
    pub generate_fake_replies: bool,
    /// Maximum number of leads to process. `0` means no cap.
    pub max_leads: usize,
}

impl CampaignConfig {
    /// Build config from a `.env` file (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend: LlmBackend = get("LLM_PROVIDER", "ollama").parse()?;

        let model = match backend {
            LlmBackend::Ollama => get("OLLAMA_MODEL", "mistral"),
            LlmBackend::Groq => get("GROQ_MODEL", "llama-3.1-8b-instant"),
        };
        let base_url = match backend {
            LlmBackend::Ollama => get("OLLAMA_HOST", "http://ollama:11434"),
            LlmBackend::Groq => get("GROQ_API_BASE", "https://api.groq.com/openai/v1"),
        };

        let api_key = get("GROQ_API_KEY", "");
        if backend == LlmBackend::Groq && api_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "GROQ_API_KEY".into(),
                hint: "Set GROQ_API_KEY or choose LLM_PROVIDER=ollama".into(),
            });
        }

        let llm = LlmConfig {
            backend,
            api_key: SecretString::from(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        let smtp = SmtpConfig {
            host: get("SMTP_HOST", "mailhog"),
            port: parse_value("SMTP_PORT", &get("SMTP_PORT", "1025"))?,
            username: get("SMTP_USER", ""),
            password: SecretString::from(get("SMTP_PASS", "")),
            from_name: get("FROM_NAME", "Acme SDR"),
            from_address: get("FROM_EMAIL", "sdr@acme.test"),
        };

        Ok(Self {
            llm,
            smtp,
            leads_csv: PathBuf::from(get("LEADS_CSV", "/data/leads.csv")),
            output_csv: PathBuf::from(get("OUTPUT_CSV", "/data/leads_out.csv")),
            reports_dir: PathBuf::from(get("REPORTS_DIR", "/reports")),
            mailhog_api: get("MAILHOG_API", DEFAULT_MAILHOG_API),
            generate_fake_replies: get("GENERATE_FAKE_REPLIES", "true").eq_ignore_ascii_case("true"),
            // Zero or negative means no cap
            max_leads: usize::try_from(parse_value::<i64>("MAX_LEADS", &get("MAX_LEADS", "0"))?)
                .unwrap_or(0),
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}
