use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ANALYTICS_URL: &str = "http://34.90.192.243/deman_gen_insights";
const DEFAULT_KEY_PATH: &str = "/app/service-account-key.json";
const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";

/// Where the service account key comes from.
#[derive(Clone)]
pub enum CredentialSource {
    File(PathBuf),
    Inline(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => f.debug_tuple("File").field(path).finish(),
            CredentialSource::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub analytics_url: String,
    pub analytics_timeout: Duration,
    pub credentials: CredentialSource,
    pub drive_api_base: String,
    pub drive_timeout: Duration,
}

impl Config {
    /// Reads the process environment. Call after `dotenv()`.
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let credentials = match lookup("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Some(json) if !json.trim().is_empty() => CredentialSource::Inline(json),
            _ => CredentialSource::File(PathBuf::from(var(
                "GOOGLE_SERVICE_ACCOUNT_KEY",
                DEFAULT_KEY_PATH,
            ))),
        };

        Ok(Config {
            server_host: var("HOST", "0.0.0.0"),
            server_port: parse("PORT", &var("PORT", "8080"))?,
            analytics_url: var("API_ENDPOINT_URL", DEFAULT_ANALYTICS_URL),
            analytics_timeout: Duration::from_secs(parse(
                "ANALYTICS_TIMEOUT_SECS",
                &var("ANALYTICS_TIMEOUT_SECS", "600"),
            )?),
            credentials,
            drive_api_base: var("DRIVE_API_BASE", DEFAULT_DRIVE_API_BASE),
            drive_timeout: Duration::from_secs(parse(
                "DRIVE_TIMEOUT_SECS",
                &var("DRIVE_TIMEOUT_SECS", "300"),
            )?),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{} must be a number, got {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]).unwrap();

        assert_eq!(cfg.listen_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.analytics_url, DEFAULT_ANALYTICS_URL);
        assert_eq!(cfg.analytics_timeout, Duration::from_secs(600));
        assert_eq!(cfg.drive_timeout, Duration::from_secs(300));
        assert!(matches!(
            cfg.credentials,
            CredentialSource::File(ref path) if path == &PathBuf::from(DEFAULT_KEY_PATH)
        ));
    }

    #[test]
    fn test_overrides() {
        let cfg = config_from(&[
            ("PORT", "3000"),
            ("API_ENDPOINT_URL", "http://localhost:9000/insights"),
            ("ANALYTICS_TIMEOUT_SECS", "30"),
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/secrets/key.json"),
        ])
        .unwrap();

        assert_eq!(cfg.server_port, 3000);
        assert_eq!(cfg.analytics_url, "http://localhost:9000/insights");
        assert_eq!(cfg.analytics_timeout, Duration::from_secs(30));
        assert!(matches!(cfg.credentials, CredentialSource::File(_)));
    }

    #[test]
    fn test_inline_key_wins_and_is_redacted() {
        let cfg = config_from(&[
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/secrets/key.json"),
            ("GOOGLE_SERVICE_ACCOUNT_JSON", r#"{"private_key": "secret"}"#),
        ])
        .unwrap();

        assert!(matches!(cfg.credentials, CredentialSource::Inline(_)));
        assert!(!format!("{:?}", cfg).contains("secret"));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
