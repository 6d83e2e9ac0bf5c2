//! Server Configuration
//!
//! Read once at startup from the process environment (after `.env` is
//! loaded). Empty variables count as unset.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use identity::infra::store::DEFAULT_MAX_CONNECTIONS;
use identity::{AuthConfig, StorageConfig};
use platform::password::HashCost;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8085";

/// HS256 keys shorter than the hash output are rejected
const MIN_JWT_SECRET_BYTES: usize = 32;

/// Upper bound for either token lifetime: one year
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment. Drives the default log level and whether a
/// signing key may be generated on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub fn default_log_filter(self) -> &'static str {
        match self {
            AppEnv::Local | AppEnv::Dev => {
                "api=debug,identity=debug,platform=debug,tower_http=debug"
            }
            AppEnv::Prod => "api=info,identity=info,platform=info,tower_http=info",
        }
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AppEnv::Local),
            "dev" => Ok(AppEnv::Dev),
            "prod" => Ok(AppEnv::Prod),
            _ => Err("expected one of local, dev, prod".to_string()),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnv::Local => write!(f, "local"),
            AppEnv::Dev => write!(f, "dev"),
            AppEnv::Prod => write!(f, "prod"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub app_env: AppEnv,
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let app_env = parse_or(&get, "APP_ENV", AppEnv::Local)?;
        let bind_addr = match get("BIND_ADDR") {
            Some(value) => parse("BIND_ADDR", value)?,
            None => parse("BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?,
        };

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("memory") => StorageConfig::memory(),
            Some("postgres") => {
                let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let max_connections =
                    parse_or(&get, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
                StorageConfig::postgres(url, max_connections)
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                    reason: "expected memory or postgres".to_string(),
                });
            }
        };

        let mut auth = match get("JWT_SECRET") {
            Some(secret) if secret.len() < MIN_JWT_SECRET_BYTES => {
                return Err(ConfigError::Invalid {
                    name: "JWT_SECRET",
                    value: "[REDACTED]".to_string(),
                    reason: format!("must be at least {MIN_JWT_SECRET_BYTES} bytes"),
                });
            }
            Some(secret) => AuthConfig {
                jwt_secret: secret.into_bytes(),
                ..AuthConfig::default()
            },
            None if app_env == AppEnv::Prod => return Err(ConfigError::Missing("JWT_SECRET")),
            None => AuthConfig::development(),
        };

        let defaults = AuthConfig::default();
        auth.access_token_ttl =
            parse_ttl(&get, "ACCESS_TOKEN_TTL_SECS", defaults.access_token_ttl)?;
        auth.refresh_token_ttl =
            parse_ttl(&get, "REFRESH_TOKEN_TTL_SECS", defaults.refresh_token_ttl)?;

        let cost = HashCost::default();
        auth.hash_cost = HashCost {
            memory_kib: parse_or(&get, "PASSWORD_HASH_MEMORY_KIB", cost.memory_kib)?,
            iterations: parse_or(&get, "PASSWORD_HASH_ITERATIONS", cost.iterations)?,
            ..cost
        };

        Ok(Self {
            app_env,
            bind_addr,
            storage,
            auth,
        })
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => parse(name, value),
        None => Ok(default),
    }
}

fn parse_ttl<G>(get: &G, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(get, name, default.as_secs())?;
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
            reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"),
        });
    }
    Ok(Duration::from_secs(secs))
}
