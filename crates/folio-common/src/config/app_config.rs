//! Application configuration structs
//!
//! Loaded from environment variables (a `.env` file is read first if present).

use folio_core::OrphanPolicy;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway: ServerConfig,
    /// `None` runs the engine on the in-memory store
    pub database: Option<DatabaseConfig>,
    /// `None` disables the cross-process realtime relay
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub engagement: EngagementConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listen address for the API and the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply embedded migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Access tokens are issued by the identity provider; the engine only
/// verifies them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// Tuning for reactions, comments, caches, and realtime delivery
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    #[serde(default = "default_profile_ttl_secs")]
    pub profile_ttl_secs: u64,
    #[serde(default = "default_reply_cache_ttl_secs")]
    pub reply_cache_ttl_secs: u64,
    /// Deepest level a reply may sit at below a top-level comment
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: i32,
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
    #[serde(default = "default_min_comment_length")]
    pub min_comment_length: usize,
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
    /// Case-insensitive terms that get a comment rejected
    #[serde(default)]
    pub disallowed_terms: Vec<String>,
    /// Longest run of the same word a comment may repeat back to back
    #[serde(default = "default_max_repeated_words")]
    pub max_repeated_words: usize,
    /// Longest run of one character, e.g. "!!!!!!!!!!!!"
    #[serde(default = "default_max_repeated_chars")]
    pub max_repeated_chars: usize,
    /// Share of uppercase among letters above which a comment is shouting
    #[serde(default = "default_max_caps_ratio")]
    pub max_caps_ratio: f64,
    /// Per-project broadcast buffer before slow subscribers start lagging
    #[serde(default = "default_realtime_buffer")]
    pub realtime_buffer: usize,
}

impl EngagementConfig {
    #[must_use]
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    #[must_use]
    pub fn reply_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.reply_cache_ttl_secs)
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            profile_ttl_secs: default_profile_ttl_secs(),
            reply_cache_ttl_secs: default_reply_cache_ttl_secs(),
            max_reply_depth: default_max_reply_depth(),
            orphan_policy: OrphanPolicy::default(),
            min_comment_length: default_min_comment_length(),
            max_comment_length: default_max_comment_length(),
            disallowed_terms: Vec::new(),
            max_repeated_words: default_max_repeated_words(),
            max_repeated_chars: default_max_repeated_chars(),
            max_caps_ratio: default_max_caps_ratio(),
            realtime_buffer: default_realtime_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "folio".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    60
}

fn default_profile_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_reply_cache_ttl_secs() -> u64 {
    300
}

fn default_max_reply_depth() -> i32 {
    3
}

fn default_min_comment_length() -> usize {
    2
}

fn default_max_comment_length() -> usize {
    2000
}

fn default_max_repeated_words() -> usize {
    4
}

fn default_max_repeated_chars() -> usize {
    10
}

fn default_max_caps_ratio() -> f64 {
    0.7
}

fn default_realtime_buffer() -> usize {
    256
}

/// Parse an optional variable, reporting garbage instead of silently defaulting
fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(None),
    }
}

fn list_var(key: &str) -> Vec<String> {
    env::var(key)
        .ok()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Only `JWT_SECRET`, `API_PORT`, and `GATEWAY_PORT` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
                run_migrations: parse_var("DATABASE_RUN_MIGRATIONS")?.unwrap_or(false),
            }),
            _ => None,
        };

        let redis = match env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => Some(RedisConfig {
                url,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_redis_max_connections),
            }),
            _ => None,
        };

        let orphan_policy = match env::var("ENGAGEMENT_ORPHAN_POLICY") {
            Ok(raw) => raw
                .parse::<OrphanPolicy>()
                .map_err(|_| ConfigError::InvalidValue("ENGAGEMENT_ORPHAN_POLICY", raw))?,
            Err(_) => OrphanPolicy::default(),
        };

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("API_PORT")?.ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            gateway: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("GATEWAY_PORT")?.ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            database,
            redis,
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
                access_token_expiry: parse_var("JWT_ACCESS_TOKEN_EXPIRY")?
                    .unwrap_or_else(default_access_token_expiry),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parse_var("RATE_LIMIT_REQUESTS_PER_SECOND")?
                    .unwrap_or_else(default_requests_per_second),
                burst: parse_var("RATE_LIMIT_BURST")?.unwrap_or_else(default_burst),
            },
            cors: CorsConfig {
                allowed_origins: list_var("CORS_ALLOWED_ORIGINS"),
            },
            snowflake: SnowflakeConfig {
                worker_id: parse_var("WORKER_ID")?.unwrap_or(0),
            },
            engagement: EngagementConfig {
                profile_ttl_secs: parse_var("ENGAGEMENT_PROFILE_TTL_SECS")?
                    .unwrap_or_else(default_profile_ttl_secs),
                reply_cache_ttl_secs: parse_var("ENGAGEMENT_REPLY_CACHE_TTL_SECS")?
                    .unwrap_or_else(default_reply_cache_ttl_secs),
                max_reply_depth: parse_var("ENGAGEMENT_MAX_REPLY_DEPTH")?
                    .unwrap_or_else(default_max_reply_depth),
                orphan_policy,
                min_comment_length: parse_var("ENGAGEMENT_MIN_COMMENT_LENGTH")?
                    .unwrap_or_else(default_min_comment_length),
                max_comment_length: parse_var("ENGAGEMENT_MAX_COMMENT_LENGTH")?
                    .unwrap_or_else(default_max_comment_length),
                disallowed_terms: list_var("ENGAGEMENT_DISALLOWED_TERMS"),
                max_repeated_words: parse_var("ENGAGEMENT_MAX_REPEATED_WORDS")?
                    .unwrap_or_else(default_max_repeated_words),
                max_repeated_chars: parse_var("ENGAGEMENT_MAX_REPEATED_CHARS")?
                    .unwrap_or_else(default_max_repeated_chars),
                max_caps_ratio: parse_var("ENGAGEMENT_MAX_CAPS_RATIO")?
                    .unwrap_or_else(default_max_caps_ratio),
                realtime_buffer: parse_var("ENGAGEMENT_REALTIME_BUFFER")?
                    .unwrap_or_else(default_realtime_buffer),
            },
        })
    }

    /// Self-contained configuration: in-memory store, no Redis, ephemeral ports
    #[must_use]
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            api: ServerConfig {
                host: default_host(),
                port: 0,
            },
            gateway: ServerConfig {
                host: default_host(),
                port: 0,
            },
            database: None,
            redis: None,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                access_token_expiry: default_access_token_expiry(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: 1000,
                burst: 1000,
            },
            cors: CorsConfig::default(),
            snowflake: SnowflakeConfig::default(),
            engagement: EngagementConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
