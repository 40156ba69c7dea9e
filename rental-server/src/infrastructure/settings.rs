use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub read_per_window: usize,
    pub write_per_window: usize,
    pub auth_per_window: usize,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub cron_secret: Option<String>,
    pub expiry_sweep_enabled: bool,
    pub expiry_sweep_interval_secs: u64,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
    pub rate_limit: RateLimitSettings,
    pub trust_proxy_headers: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = EnvReader { lookup };

        let environment = match env.get("APP_ENV").as_deref().map(str::trim) {
            Some("production") | Some("prod") => Environment::Production,
            Some("development") | Some("dev") | Some("") | None => Environment::Development,
            Some(other) => return Err(anyhow!("unknown APP_ENV '{other}'")),
        };

        let database_url = env.required("DATABASE_URL")?;
        let jwt_secret = env.required("JWT_SECRET")?;
        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let cron_secret = env
            .get("CRON_SECRET")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if environment == Environment::Production && cron_secret.is_none() {
            return Err(anyhow!("CRON_SECRET is required in production"));
        }

        let http_addr = env
            .get("HTTP_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            env.get("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        );
        let log_level = env
            .get("LOG_LEVEL")
            .or_else(|| env.get("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            database_url,
            database_max_connections: env.positive("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            http_addr,
            cors_origins,
            log_level,
            cron_secret,
            expiry_sweep_enabled: env.flag("EXPIRY_SWEEP_ENABLED", false)?,
            expiry_sweep_interval_secs: env.positive("EXPIRY_SWEEP_INTERVAL_SECS", 24 * 60 * 60)?,
            http_request_body_limit_bytes: env
                .positive("HTTP_REQUEST_BODY_LIMIT_BYTES", 64 * 1024)?,
            http_concurrency_limit: env.positive("HTTP_CONCURRENCY_LIMIT", 256)?,
            http_request_timeout_secs: env.positive("HTTP_REQUEST_TIMEOUT_SECS", 10)?,
            rate_limit: RateLimitSettings {
                read_per_window: env.positive("RATE_LIMIT_READ_PER_WINDOW", 120)?,
                write_per_window: env.positive("RATE_LIMIT_WRITE_PER_WINDOW", 30)?,
                auth_per_window: env.positive("RATE_LIMIT_AUTH_PER_WINDOW", 10)?,
                window_secs: env.positive("RATE_LIMIT_WINDOW_SECS", 60)?,
            },
            trust_proxy_headers: env.flag("TRUST_PROXY_HEADERS", false)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn required(&self, key: &str) -> Result<String> {
        let value = self.get(key).with_context(|| format!("{key} is required"))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(anyhow!("{key} must not be empty"));
        }
        Ok(value)
    }

    fn positive<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + PartialEq + Default,
    {
        let value = match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow!("Failed to parse {key}, expecting positive integer"))?,
            None => default,
        };

        if value == T::default() {
            return Err(anyhow!("{key} must be > 0"));
        }
        Ok(value)
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).as_deref().map(str::trim) {
            None => Ok(default),
            Some("1") | Some("true") | Some("yes") => Ok(true),
            Some("0") | Some("false") | Some("no") => Ok(false),
            Some(other) => Err(anyhow!("{key} must be a boolean, got '{other}'")),
        }
    }
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
