use std::env;

use tracing::{debug, warn};

pub const DEFAULT_CONTENT_URL: &str = "http://localhost:3000/chapters";
pub const DEFAULT_STUDENT_URL: &str = "http://localhost:5200";
pub const DEFAULT_AUTH_URL: &str = "http://localhost:5400";
pub const DEFAULT_TUTOR_URL: &str = "http://localhost:5001/rag";

/// Tutor questions a learner may ask per chapter unless the chapter sets its own limit.
pub const DEFAULT_TUTOR_TOKENS: u32 = 3;

/// Endpoint bases for every collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// where `index.json` and `<id>.json` are served from
    pub content_url: String,
    pub student_url: String,
    pub auth_url: String,
    /// full url of the retrieval tutor, posted to as-is
    pub tutor_url: String,
    pub default_tutor_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_url: DEFAULT_CONTENT_URL.to_string(),
            student_url: DEFAULT_STUDENT_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            tutor_url: DEFAULT_TUTOR_URL.to_string(),
            default_tutor_tokens: DEFAULT_TUTOR_TOKENS,
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let url = |key: &str, fallback: String| {
            lookup(key)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        let default_tutor_tokens = match lookup("EDUAI_TUTOR_TOKENS") {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                warn!(value = %raw, "EDUAI_TUTOR_TOKENS is not a number, using default");
                defaults.default_tutor_tokens
            }),
            None => defaults.default_tutor_tokens,
        };

        Self {
            content_url: url("EDUAI_CONTENT_URL", defaults.content_url),
            student_url: url("EDUAI_STUDENT_URL", defaults.student_url),
            auth_url: url("EDUAI_AUTH_URL", defaults.auth_url),
            tutor_url: url("RAG_URL", defaults.tutor_url),
            default_tutor_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.tutor_url, "http://localhost:5001/rag");
    }

    #[test]
    fn overrides_and_trims_trailing_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAG_URL", "https://tutor.example.org/rag/"),
            ("EDUAI_CONTENT_URL", "https://cdn.example.org/chapters/"),
            ("EDUAI_TUTOR_TOKENS", "5"),
        ]));
        assert_eq!(config.tutor_url, "https://tutor.example.org/rag");
        assert_eq!(config.content_url, "https://cdn.example.org/chapters");
        assert_eq!(config.default_tutor_tokens, 5);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn blank_or_bad_values_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAG_URL", "   "),
            ("EDUAI_TUTOR_TOKENS", "lots"),
        ]));
        assert_eq!(config.tutor_url, DEFAULT_TUTOR_URL);
        assert_eq!(config.default_tutor_tokens, DEFAULT_TUTOR_TOKENS);
    }
}
