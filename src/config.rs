use std::env;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct Config {
    // Token signing
    pub signing_secret: String,
    pub previous_signing_secret: Option<String>,

    // SIWE challenge identity
    pub siwe_domain: String,
    pub siwe_uri: String,
    pub siwe_statement: String,
    pub siwe_resources: Vec<String>,
    pub supported_chain_ids: Vec<u64>,

    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,

    // TTLs (in seconds)
    pub nonce_ttl_secs: u64,
    pub session_ttl_secs: u64,
    pub challenge_window_secs: u64,
    pub refresh_threshold_secs: u64,

    // Rate limiting
    pub rate_limit_auth_per_min: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("signing_secret", &"[REDACTED]")
            .field("previous_signing_secret", &"[REDACTED]")
            .field("siwe_domain", &self.siwe_domain)
            .field("siwe_uri", &self.siwe_uri)
            .field("siwe_statement", &self.siwe_statement)
            .field("siwe_resources", &self.siwe_resources)
            .field("supported_chain_ids", &self.supported_chain_ids)
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("nonce_ttl_secs", &self.nonce_ttl_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("challenge_window_secs", &self.challenge_window_secs)
            .field("refresh_threshold_secs", &self.refresh_threshold_secs)
            .field("rate_limit_auth_per_min", &self.rate_limit_auth_per_min)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Token signing secret is required and never returned in any response
        let signing_secret = env::var("SESSION_SIGNING_SECRET")
            .map_err(|_| ConfigError::MissingVar("SESSION_SIGNING_SECRET".to_string()))?;

        if signing_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SIGNING_SECRET".to_string(),
                "must be at least 32 bytes".to_string(),
            ));
        }

        // Optional previous secret, accepted for token validation only so a
        // rollover doesn't invalidate outstanding tokens
        let previous_signing_secret = match env::var("SESSION_SIGNING_SECRET_PREVIOUS") {
            Ok(s) if !s.is_empty() => {
                if s.len() < 32 {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_SIGNING_SECRET_PREVIOUS".to_string(),
                        "must be at least 32 bytes".to_string(),
                    ));
                }
                Some(s)
            }
            _ => None,
        };

        // SIWE message identity
        let siwe_domain = env::var("SIWE_DOMAIN")
            .map_err(|_| ConfigError::MissingVar("SIWE_DOMAIN".to_string()))?;
        if siwe_domain.is_empty() || siwe_domain.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(
                "SIWE_DOMAIN".to_string(),
                "must be a non-empty authority without whitespace".to_string(),
            ));
        }

        let siwe_uri = env::var("SIWE_URI").unwrap_or_else(|_| format!("https://{}", siwe_domain));

        let siwe_statement = env::var("SIWE_STATEMENT")
            .unwrap_or_else(|_| "Sign in to the Agora governance portal.".to_string());
        // A line break in the statement would corrupt the fixed message layout
        if siwe_statement.contains('\n') {
            return Err(ConfigError::InvalidValue(
                "SIWE_STATEMENT".to_string(),
                "must not contain line breaks".to_string(),
            ));
        }

        let siwe_resources: Vec<String> = env::var("SIWE_RESOURCES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let supported_chain_ids_str =
            env::var("SUPPORTED_CHAIN_IDS").unwrap_or_else(|_| "1,11155111".to_string());
        let mut supported_chain_ids = Vec::new();
        for part in supported_chain_ids_str.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let id = part.parse::<u64>().map_err(|e| {
                ConfigError::ParseError(
                    "SUPPORTED_CHAIN_IDS".to_string(),
                    format!("{}: {}", e, part),
                )
            })?;
            supported_chain_ids.push(id);
        }
        if supported_chain_ids.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SUPPORTED_CHAIN_IDS".to_string(),
                "must list at least one chain id".to_string(),
            ));
        }

        // Redis — required to prevent silent unauthenticated connections
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // TTLs. The nonce expires fast to limit replay; the challenge window
        // and the session live longer.
        let nonce_ttl_secs = parse_env_or_default("NONCE_TTL_SECS", 600)?;
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        let challenge_window_secs = parse_env_or_default("CHALLENGE_WINDOW_SECS", 86_400)?;
        let refresh_threshold_secs = parse_env_or_default("REFRESH_THRESHOLD_SECS", 3_600)?;

        if refresh_threshold_secs >= session_ttl_secs {
            return Err(ConfigError::InvalidValue(
                "REFRESH_THRESHOLD_SECS".to_string(),
                "must be shorter than SESSION_TTL_SECS".to_string(),
            ));
        }

        // Rate limiting
        let rate_limit_auth_per_min = parse_env_or_default("RATE_LIMIT_AUTH_PER_MIN", 10)?;

        Ok(Config {
            signing_secret,
            previous_signing_secret,
            siwe_domain,
            siwe_uri,
            siwe_statement,
            siwe_resources,
            supported_chain_ids,
            redis_url,
            bind_addr,
            nonce_ttl_secs,
            session_ttl_secs,
            challenge_window_secs,
            refresh_threshold_secs,
            rate_limit_auth_per_min,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests run serially since they modify global env vars.
    // unwrap_or_else handles poison from prior panics.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn clear_test_env() {
        env::remove_var("SESSION_SIGNING_SECRET");
        env::remove_var("SESSION_SIGNING_SECRET_PREVIOUS");
        env::remove_var("SIWE_DOMAIN");
        env::remove_var("SIWE_URI");
        env::remove_var("SIWE_STATEMENT");
        env::remove_var("SIWE_RESOURCES");
        env::remove_var("SUPPORTED_CHAIN_IDS");
        env::remove_var("REDIS_URL");
        env::remove_var("BIND_ADDR");
        env::remove_var("NONCE_TTL_SECS");
        env::remove_var("SESSION_TTL_SECS");
        env::remove_var("CHALLENGE_WINDOW_SECS");
        env::remove_var("REFRESH_THRESHOLD_SECS");
        env::remove_var("RATE_LIMIT_AUTH_PER_MIN");
    }

    fn set_required_env() {
        env::set_var("SESSION_SIGNING_SECRET", TEST_SECRET);
        env::set_var("SIWE_DOMAIN", "gov.example.org");
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_U64", "12345");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_U64");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_U64", 100);
        assert_eq!(result.unwrap(), 100);
    }

    #[test]
    fn test_missing_signing_secret() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SIWE_DOMAIN", "gov.example.org");
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::MissingVar(ref s) if s == "SESSION_SIGNING_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_short_signing_secret() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SESSION_SIGNING_SECRET", "too-short");
        env::set_var("SIWE_DOMAIN", "gov.example.org");
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_SIGNING_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_short_previous_secret() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var("SESSION_SIGNING_SECRET_PREVIOUS", "short");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_SIGNING_SECRET_PREVIOUS"
        ));

        clear_test_env();
    }

    #[test]
    fn test_missing_siwe_domain() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("SESSION_SIGNING_SECRET", TEST_SECRET);
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::MissingVar(ref s) if s == "SIWE_DOMAIN"
        ));

        clear_test_env();
    }

    #[test]
    fn test_statement_with_newline_rejected() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var("SIWE_STATEMENT", "line one\nline two");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SIWE_STATEMENT"
        ));

        clear_test_env();
    }

    #[test]
    fn test_invalid_chain_ids() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var("SUPPORTED_CHAIN_IDS", "1,mainnet");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_invalid_socket_addr() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var("BIND_ADDR", "invalid_address");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_refresh_threshold_must_undercut_session_ttl() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var("SESSION_TTL_SECS", "3600");
        env::set_var("REFRESH_THRESHOLD_SECS", "3600");

        let result = Config::from_env();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "REFRESH_THRESHOLD_SECS"
        ));

        clear_test_env();
    }

    #[test]
    fn test_config_defaults() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();
        env::set_var("BIND_ADDR", "0.0.0.0:3000");

        let config = Config::from_env().unwrap();

        assert_eq!(config.signing_secret, TEST_SECRET);
        assert!(config.previous_signing_secret.is_none());
        assert_eq!(config.siwe_domain, "gov.example.org");
        assert_eq!(config.siwe_uri, "https://gov.example.org");
        assert_eq!(
            config.siwe_statement,
            "Sign in to the Agora governance portal."
        );
        assert!(config.siwe_resources.is_empty());
        assert_eq!(config.supported_chain_ids, vec![1, 11155111]);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.nonce_ttl_secs, 600);
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.challenge_window_secs, 86_400);
        assert_eq!(config.refresh_threshold_secs, 3_600);
        assert_eq!(config.rate_limit_auth_per_min, 10);

        clear_test_env();
    }

    #[test]
    fn test_resources_parsing() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        env::set_var(
            "SIWE_RESOURCES",
            "https://gov.example.org/proposals, ipfs://QmTreasury ",
        );

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.siwe_resources,
            vec!["https://gov.example.org/proposals", "ipfs://QmTreasury"]
        );

        clear_test_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let _guard = lock_test();
        clear_test_env();
        set_required_env();

        let config = Config::from_env().unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(TEST_SECRET));
        assert!(!rendered.contains("redis://127.0.0.1"));
        assert!(rendered.contains("[REDACTED]"));

        clear_test_env();
    }
}
