use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub role_lookup_timeout_ms: u64,
    pub role_cache_ttl_secs: u64,
    pub rate_limit_sweep_secs: u64,
    pub max_body_kb: usize,
    pub ai_api_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_url: "sqlite:solarquote.db?mode=rwc".to_string(),
            role_lookup_timeout_ms: 2000,
            role_cache_ttl_secs: 30,
            rate_limit_sweep_secs: 300,
            max_body_kb: 64,
            ai_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            ai_api_key: None,
            ai_model: "gpt-4o-mini".to_string(),
            ai_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SOLARQUOTE_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("SOLARQUOTE_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(ms) = std::env::var("SOLARQUOTE_ROLE_LOOKUP_TIMEOUT_MS") {
            if let Ok(v) = ms.parse() {
                config.role_lookup_timeout_ms = v;
            }
        }

        if let Ok(secs) = std::env::var("SOLARQUOTE_ROLE_CACHE_TTL_SECS") {
            if let Ok(v) = secs.parse() {
                config.role_cache_ttl_secs = v;
            }
        }

        if let Ok(secs) = std::env::var("SOLARQUOTE_RATE_LIMIT_SWEEP_SECS") {
            if let Ok(v) = secs.parse() {
                config.rate_limit_sweep_secs = v;
            }
        }

        if let Ok(kb) = std::env::var("SOLARQUOTE_MAX_BODY_KB") {
            if let Ok(v) = kb.parse() {
                config.max_body_kb = v;
            }
        }

        if let Ok(url) = std::env::var("AI_API_URL") {
            config.ai_api_url = url;
        }

        if let Ok(key) = std::env::var("AI_API_KEY") {
            if !key.trim().is_empty() {
                config.ai_api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("AI_MODEL") {
            config.ai_model = model;
        }

        if let Ok(secs) = std::env::var("AI_TIMEOUT_SECS") {
            if let Ok(v) = secs.parse() {
                config.ai_timeout_secs = v;
            }
        }

        config
    }

    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.role_lookup_timeout_ms)
    }

    pub fn role_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.role_cache_ttl_secs)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        // Intervallo minimo di 1s per non far girare il task a vuoto
        Duration::from_secs(self.rate_limit_sweep_secs.max(1))
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_kb * 1024
    }
}

// Percorsi che formano il contratto di routing
pub mod paths {
    pub const LANDING: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const SIGNUP: &str = "/signup";
    pub const HOMEOWNER_PREFIX: &str = "/homeowner";
    pub const INSTALLER_PREFIX: &str = "/installer";
    pub const ADMIN_PREFIX: &str = "/admin";
    pub const HOMEOWNER_HOME: &str = "/homeowner/dashboard";
    pub const INSTALLER_HOME: &str = "/installer/dashboard";

    /// Nome del cookie che trasporta il token di sessione
    pub const SESSION_COOKIE: &str = "sq_session";

    /// Parametro di query con la destinazione originale dopo il login
    pub const REDIRECT_PARAM: &str = "redirectTo";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let config = Config::default();
        assert_eq!(config.role_lookup_timeout(), Duration::from_secs(2));
        assert_eq!(config.rate_limit_sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.max_body_bytes(), 64 * 1024);
    }

    #[test]
    fn test_sweep_interval_never_zero() {
        let config = Config {
            rate_limit_sweep_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.rate_limit_sweep_interval(), Duration::from_secs(1));
    }
}
