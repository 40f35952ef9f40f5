use std::path::PathBuf;

use relay_core::ManifestGate;
use thiserror::Error;

/// Default staging directory, relative to the working directory.
pub const DEFAULT_STAGING_DIR: &str = "downloads";

/// Default manifest path, overwritten on each gated run.
pub const DEFAULT_MANIFEST_PATH: &str = "uploaded_images.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("WEVERSE_EMAIL and WEVERSE_PASSWORD must be set together")]
    PartialLoginCredentials,
    #[error("invalid RELAY_MANIFEST_GATE: {0}")]
    InvalidGate(#[from] relay_core::GateParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// How the batch relates to a remote album.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlbumOption {
    /// Publish without album association.
    #[default]
    None,
    /// Associate uploads with a pre-created album via its deletehash.
    Existing { deletehash: String },
    /// Create a fresh anonymous album for this batch.
    CreateNew { title: String },
}

/// Process configuration, constructed once at startup and passed by
/// reference into the components. Business logic never reads the
/// environment directly.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub client_id: String,
    pub source_url: Option<String>,
    pub album: AlbumOption,
    pub weverse_login: Option<LoginCredentials>,
    pub manifest_gate: ManifestGate,
    pub staging_dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl RelayConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. The seam used by tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = lookup("IMGUR_CLIENT_ID").ok_or(ConfigError::MissingVar("IMGUR_CLIENT_ID"))?;

        let weverse_login = match (lookup("WEVERSE_EMAIL"), lookup("WEVERSE_PASSWORD")) {
            (Some(email), Some(password)) => Some(LoginCredentials { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialLoginCredentials),
        };

        let album = if let Some(deletehash) = lookup("IMGUR_ALBUM_DELETEHASH") {
            AlbumOption::Existing { deletehash }
        } else if lookup("RELAY_CREATE_ALBUM").is_some_and(|v| v == "1" || v == "true") {
            AlbumOption::CreateNew {
                title: lookup("RELAY_ALBUM_TITLE").unwrap_or_else(|| "Relayed media".to_string()),
            }
        } else {
            AlbumOption::None
        };

        let manifest_gate = match lookup("RELAY_MANIFEST_GATE") {
            Some(raw) => raw.parse::<ManifestGate>()?,
            None => ManifestGate::default(),
        };

        Ok(Self {
            client_id,
            source_url: lookup("SOURCE_URL"),
            album,
            weverse_login,
            manifest_gate,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn client_id_is_required() {
        let err = RelayConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("IMGUR_CLIENT_ID")));
    }

    #[test]
    fn minimal_configuration_defaults() {
        let config = RelayConfig::from_lookup(env(&[("IMGUR_CLIENT_ID", "abc")])).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.source_url, None);
        assert_eq!(config.album, AlbumOption::None);
        assert_eq!(config.weverse_login, None);
        assert_eq!(config.manifest_gate, ManifestGate::AllProcessed);
        assert_eq!(config.staging_dir, PathBuf::from(DEFAULT_STAGING_DIR));
        assert_eq!(config.manifest_path, PathBuf::from(DEFAULT_MANIFEST_PATH));
    }

    #[test]
    fn partial_weverse_credentials_are_rejected() {
        let err = RelayConfig::from_lookup(env(&[
            ("IMGUR_CLIENT_ID", "abc"),
            ("WEVERSE_EMAIL", "user@example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::PartialLoginCredentials));
    }

    #[test]
    fn existing_album_wins_over_create_flag() {
        let config = RelayConfig::from_lookup(env(&[
            ("IMGUR_CLIENT_ID", "abc"),
            ("IMGUR_ALBUM_DELETEHASH", "dh123"),
            ("RELAY_CREATE_ALBUM", "1"),
        ]))
        .unwrap();
        assert_eq!(
            config.album,
            AlbumOption::Existing {
                deletehash: "dh123".to_string()
            }
        );
    }

    #[test]
    fn create_album_uses_configured_title() {
        let config = RelayConfig::from_lookup(env(&[
            ("IMGUR_CLIENT_ID", "abc"),
            ("RELAY_CREATE_ALBUM", "true"),
            ("RELAY_ALBUM_TITLE", "Tour photos"),
        ]))
        .unwrap();
        assert_eq!(
            config.album,
            AlbumOption::CreateNew {
                title: "Tour photos".to_string()
            }
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = RelayConfig::from_lookup(env(&[("IMGUR_CLIENT_ID", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn gate_is_parsed_from_environment() {
        let config = RelayConfig::from_lookup(env(&[
            ("IMGUR_CLIENT_ID", "abc"),
            ("RELAY_MANIFEST_GATE", "all-succeeded"),
        ]))
        .unwrap();
        assert_eq!(config.manifest_gate, ManifestGate::AllSucceeded);

        let err = RelayConfig::from_lookup(env(&[
            ("IMGUR_CLIENT_ID", "abc"),
            ("RELAY_MANIFEST_GATE", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGate(_)));
    }
}
