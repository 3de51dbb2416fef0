//! Gateway configuration, loaded from the environment at startup.

use std::net::SocketAddr;

use secrecy::SecretString;
use url::Url;

use crate::error::{Error, ErrorDetails};

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_BASIC_DAILY_LIMIT: u32 = 50;
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1/";
const DEFAULT_JWT_SECRET: &str = "elysiango_secret";

#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Connection string for the subscriber record store. When absent, the
    /// gateway falls back to a process-local in-memory store.
    pub database_url: Option<String>,
    pub openai_api_key: SecretString,
    pub openai_api_base: Url,
    pub jwt_secret: SecretString,
    pub basic_daily_limit: u32,
    /// Shared admin key for the token-issuing endpoint. When unset, the
    /// endpoint is open (matching the original deployment behavior).
    pub admin_api_key: Option<SecretString>,
    pub tiers: TierTable,
}

/// Generation parameters for one access tier. These are configuration values,
/// never computed.
#[derive(Debug, Clone)]
pub struct TierGenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// How many trailing conversation-history entries are forwarded.
    pub history_window: usize,
}

#[derive(Debug, Clone)]
pub struct TierTable {
    pub basic: TierGenerationConfig,
    pub pro: TierGenerationConfig,
    pub translate: TierGenerationConfig,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            basic: TierGenerationConfig {
                model: "gpt-4.1-mini".to_string(),
                max_tokens: 800,
                temperature: 0.3,
                history_window: 5,
            },
            pro: TierGenerationConfig {
                model: "gpt-4.1".to_string(),
                max_tokens: 2000,
                temperature: 0.3,
                history_window: 12,
            },
            translate: TierGenerationConfig {
                model: "gpt-4.1-mini".to_string(),
                max_tokens: 800,
                temperature: 0.2,
                history_window: 0,
            },
        }
    }
}

impl Config {
    /// Load and verify the configuration from the process environment.
    pub fn load_and_verify_from_env() -> Result<Self, Error> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| {
                Error::new(ErrorDetails::Config {
                    message: format!("Invalid PORT value `{raw}`: {e}"),
                })
            })?,
            Err(_) => DEFAULT_PORT,
        };
        let bind_address = SocketAddr::from(([0, 0, 0, 0], port));

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map(SecretString::from)
            .map_err(|_| {
                Error::new(ErrorDetails::Config {
                    message: "Missing environment variable OPENAI_API_KEY".to_string(),
                })
            })?;

        let openai_api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());
        let openai_api_base = Url::parse(&openai_api_base).map_err(|e| {
            Error::new(ErrorDetails::Config {
                message: format!("Invalid OPENAI_API_BASE `{openai_api_base}`: {e}"),
            })
        })?;

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => SecretString::from(secret),
            Err(_) => {
                tracing::warn!(
                    "JWT_SECRET is not set; falling back to the built-in default. Set JWT_SECRET in production."
                );
                SecretString::from(DEFAULT_JWT_SECRET)
            }
        };

        let database_url = std::env::var("MUTAWWIF_DATABASE_URL").ok();

        let basic_daily_limit = basic_daily_limit_from_env();

        let admin_api_key = std::env::var("ADMIN_API_KEY").ok().map(SecretString::from);

        Ok(Self {
            bind_address,
            database_url,
            openai_api_key,
            openai_api_base,
            jwt_secret,
            basic_daily_limit,
            admin_api_key,
            tiers: TierTable::default(),
        })
    }
}

/// The daily limit is advisory, so a missing or malformed value never fails
/// startup; it falls back to the default of 50.
fn basic_daily_limit_from_env() -> u32 {
    match std::env::var("BASIC_DAILY_LIMIT") {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(limit) => limit,
            Err(_) => {
                tracing::warn!(
                    "Invalid BASIC_DAILY_LIMIT value `{raw}`; using default of {DEFAULT_BASIC_DAILY_LIMIT}"
                );
                DEFAULT_BASIC_DAILY_LIMIT
            }
        },
        Err(_) => DEFAULT_BASIC_DAILY_LIMIT,
    }
}
