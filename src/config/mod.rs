//! Typed configuration from a TOML file, with environment fallbacks.
//!
//! Loads once at startup, fails fast if a required value is missing.
//! The API key is wrapped in secrecy::SecretString to prevent log leaks.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Assistant v1 API version date sent with every request.
pub const DEFAULT_API_VERSION: &str = "2021-06-14";

#[derive(Debug)]
pub struct Config {
    /// Service instance URL, e.g. `https://api.us-south.assistant.watson.cloud.ibm.com/instances/<id>`.
    pub instance_url: String,
    pub api_key: SecretString,
    /// IAM endpoint the API key is exchanged against.
    pub auth_url: String,
    pub api_version: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

#[derive(Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    instance: InstanceSection,
    #[serde(default)]
    authentication: AuthenticationSection,
}

#[derive(Default, Deserialize)]
struct InstanceSection {
    url: Option<String>,
    api_key: Option<String>,
    version: Option<String>,
}

#[derive(Default, Deserialize)]
struct AuthenticationSection {
    auth_url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is tolerated so that the environment alone can supply
    /// the values (call `dotenvy::dotenv().ok()` before this in local dev).
    /// Any value left empty after the environment fallback is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let file: ConfigFile = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("invalid config at {}: {e}", path.display())))?
        } else {
            ConfigFile::default()
        };
        Self::from_parts(file, path)
    }

    /// Parse configuration from TOML text. `origin` is only used in messages.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("invalid config at {}: {e}", origin.display())))?;
        Self::from_parts(file, origin)
    }

    fn from_parts(file: ConfigFile, origin: &Path) -> Result<Self> {
        let instance_url = file
            .instance
            .url
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_value("ASSISTANT_URL"))
            .ok_or_else(|| {
                Error::Config(format!(
                    "Please provide an instance url under [instance] url in `{}` \
                     or set ASSISTANT_URL.",
                    origin.display()
                ))
            })?;

        let api_key = file
            .instance
            .api_key
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_value("ASSISTANT_API_KEY"))
            .map(|v| SecretString::from(v.trim().to_string()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "Please provide an API key under [instance] api_key in `{}` \
                     or set ASSISTANT_API_KEY.",
                    origin.display()
                ))
            })?;

        let auth_url = file
            .authentication
            .auth_url
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_value("IAM_AUTH_URL"))
            .ok_or_else(|| {
                Error::Config(format!(
                    "Please provide an IAM URL under [authentication] auth_url in `{}` \
                     or set IAM_AUTH_URL.\n\
                     See https://cloud.ibm.com/apidocs/assistant-v1#authentication for directions.",
                    origin.display()
                ))
            })?;

        Ok(Self {
            instance_url: instance_url.trim().trim_end_matches('/').to_string(),
            api_key,
            auth_url: auth_url.trim().trim_end_matches('/').to_string(),
            api_version: file
                .instance
                .version
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    // Env fallbacks are exercised in tests/config_test.rs; these only use
    // values that are present in the file, so they don't race on env vars.

    #[test]
    fn version_defaults_when_absent() {
        let config = Config::from_toml_str(
            r#"
            [instance]
            url = "https://assistant.example/instances/abc/"
            api_key = "key"

            [authentication]
            auth_url = "https://iam.example"
            "#,
            Path::new("config.toml"),
        )
        .unwrap();

        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.instance_url, "https://assistant.example/instances/abc");
        assert_eq!(config.api_key.expose_secret(), "key");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::from_toml_str("[instance\nurl = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("bad.toml")));
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = Config::from_toml_str(
            r#"
            [instance]
            url = "https://assistant.example"
            api_key = "super-secret"
            version = "2020-04-01"

            [authentication]
            auth_url = "https://iam.example"
            "#,
            Path::new("config.toml"),
        )
        .unwrap();

        assert_eq!(config.api_version, "2020-04-01");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn api_key_and_version_are_trimmed() {
        let config = Config::from_toml_str(
            r#"
            [instance]
            url = "https://assistant.example"
            api_key = "  padded-key\n"
            version = "   "

            [authentication]
            auth_url = "https://iam.example"
            "#,
            Path::new("config.toml"),
        )
        .unwrap();

        assert_eq!(config.api_key.expose_secret(), "padded-key");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }
}
