//! Configuration for the recipe backend

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Options for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    /// The API key; `None` makes every generation fail as misconfigured
    pub api_key: Option<String>,

    /// The model name
    pub model: String,

    /// The API base URL
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_output_tokens: u32,

    /// The request timeout
    pub request_timeout: Duration,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.7,
            max_output_tokens: 4000,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiOptions {
    pub fn with_api_key(mut self, value: &str) -> Self {
        self.api_key = Some(value.to_string());
        self
    }

    pub fn with_model(mut self, value: &str) -> Self {
        self.model = value.to_string();
        self
    }

    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.to_string();
        self
    }

    pub fn with_temperature(mut self, value: f32) -> Self {
        self.temperature = value;
        self
    }

    pub fn with_max_output_tokens(mut self, value: u32) -> Self {
        self.max_output_tokens = value;
        self
    }

    pub fn with_request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = value;
        self
    }
}

/// Supabase project coordinates
#[derive(Debug, Clone, Default)]
pub struct SupabaseOptions {
    /// The base URL for the Supabase project
    pub url: String,

    /// The anonymous API key, used to verify user tokens
    pub anon_key: String,

    /// The service role key, used for favorites and account deletion
    pub service_role_key: String,
}

/// Options for the recipe cache
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub max_items: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_items: 100,
        }
    }
}

/// Fixed window limits for the generation route
#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Top level configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Deployment environment, `development` relaxes CORS
    pub environment: String,

    /// Allowed CORS origins outside development
    pub cors_origins: Vec<String>,

    pub gemini: GeminiOptions,
    pub supabase: SupabaseOptions,
    pub cache: CacheOptions,
    pub rate_limit: RateLimitOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "production".to_string(),
            cors_origins: vec!["https://chefia.up.railway.app".to_string()],
            gemini: GeminiOptions::default(),
            supabase: SupabaseOptions::default(),
            cache: CacheOptions::default(),
            rate_limit: RateLimitOptions::default(),
        }
    }
}

impl Config {
    /// Load `.env.local` and `.env` (when present), then read the process
    /// environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let environment = get("NODE_ENV")
            .or_else(|| get("APP_ENV"))
            .unwrap_or(defaults.environment);

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        let gemini = GeminiOptions {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
            base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
            temperature: parse_or(&get, "GEMINI_TEMPERATURE", defaults.gemini.temperature)?,
            max_output_tokens: parse_or(
                &get,
                "GEMINI_MAX_OUTPUT_TOKENS",
                defaults.gemini.max_output_tokens,
            )?,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "GEMINI_TIMEOUT_SECS",
                defaults.gemini.request_timeout.as_secs(),
            )?),
        };

        let supabase = SupabaseOptions {
            url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
            anon_key: get("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            service_role_key: get("SUPABASE_SERVICE_ROLE_KEY")
                .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?,
        };

        let cache = CacheOptions {
            ttl: Duration::from_secs(parse_or(
                &get,
                "RECIPE_CACHE_TTL_SECS",
                defaults.cache.ttl.as_secs(),
            )?),
            max_items: parse_or(&get, "RECIPE_CACHE_MAX_ITEMS", defaults.cache.max_items)?,
        };

        let rate_limit = RateLimitOptions {
            max_requests: parse_or(
                &get,
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit.max_requests,
            )?,
            window: Duration::from_secs(parse_or(
                &get,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window.as_secs(),
            )?),
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            environment,
            cors_origins,
            gemini,
            supabase,
            cache,
            rate_limit,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_environment(mut self, value: &str) -> Self {
        self.environment = value.to_string();
        self
    }

    pub fn with_gemini(mut self, value: GeminiOptions) -> Self {
        self.gemini = value;
        self
    }

    pub fn with_cache(mut self, value: CacheOptions) -> Self {
        self.cache = value;
        self
    }

    pub fn with_rate_limit(mut self, value: RateLimitOptions) -> Self {
        self.rate_limit = value;
        self
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
