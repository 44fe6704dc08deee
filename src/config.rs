//! Runtime configuration from the environment (and an optional `.env` file).

use std::fmt;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_UPLOAD_BUCKET: &str = "meeting-uploads";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MIN_SESSION_KEY_LEN: usize = 64;

/// Which implementation of the remote data service to talk to.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Supabase { url: String, anon_key: String },
    /// In-process store; seeded with one admin account when credentials are given.
    Memory {
        admin_email: Option<String>,
        admin_password: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` when unset or too short; a random key is generated instead.
    pub session_key: Option<Vec<u8>>,
    pub cookie_secure: bool,
    pub backend: Backend,
    pub upload_bucket: String,
    pub http_timeout: Duration,
    pub max_upload_bytes: usize,
    pub static_dir: String,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing required setting {key}"),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {key}: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let session_key = match get("SESSION_KEY") {
            Some(val) if val.len() >= MIN_SESSION_KEY_LEN => Some(val.into_bytes()),
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {MIN_SESSION_KEY_LEN}+), generating random key",
                    val.len()
                );
                None
            }
            None => None,
        };

        let supabase_url = get("SUPABASE_URL");
        let backend_name = get("DATA_BACKEND").unwrap_or_else(|| {
            if supabase_url.is_some() { "supabase" } else { "memory" }.to_string()
        });

        let backend = match backend_name.to_lowercase().as_str() {
            "supabase" => Backend::Supabase {
                url: supabase_url.ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            },
            "memory" => Backend::Memory {
                admin_email: get("ADMIN_EMAIL"),
                admin_password: get("ADMIN_PASSWORD"),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    key: "DATA_BACKEND",
                    value: backend_name,
                });
            }
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_key,
            cookie_secure: parse_bool("COOKIE_SECURE", get("COOKIE_SECURE"))?,
            backend,
            upload_bucket: get("UPLOAD_BUCKET").unwrap_or_else(|| DEFAULT_UPLOAD_BUCKET.to_string()),
            http_timeout: Duration::from_secs(parse_num(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_upload_bytes: parse_num(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "./static".to_string()),
        })
    }
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(false);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_num<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_memory_backend() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.upload_bucket, "meeting-uploads");
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert!(!cfg.cookie_secure);
        assert!(cfg.session_key.is_none());
        assert_eq!(
            cfg.backend,
            Backend::Memory { admin_email: None, admin_password: None }
        );
    }

    #[test]
    fn supabase_url_selects_remote_backend() {
        let cfg = load(&[
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("COOKIE_SECURE", "true"),
        ])
        .unwrap();
        assert!(cfg.cookie_secure);
        assert_eq!(
            cfg.backend,
            Backend::Supabase {
                url: "https://proj.supabase.co".into(),
                anon_key: "anon".into()
            }
        );
    }

    #[test]
    fn missing_anon_key_is_reported() {
        let err = load(&[("SUPABASE_URL", "https://proj.supabase.co")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(load(&[("DATA_BACKEND", "sqlite")]).is_err());
        assert!(load(&[("HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("COOKIE_SECURE", "maybe")]).is_err());
    }

    #[test]
    fn short_session_key_is_dropped() {
        assert!(load(&[("SESSION_KEY", "short")]).unwrap().session_key.is_none());
        let long = "k".repeat(64);
        let cfg = load(&[("SESSION_KEY", long.as_str())]).unwrap();
        assert_eq!(cfg.session_key.map(|k| k.len()), Some(64));
    }
}
