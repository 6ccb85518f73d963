use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service and the recruiting pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub recruiting: RecruitingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            recruiting: RecruitingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Pipeline knobs that operators tune per deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct RecruitingConfig {
    /// Classifications below this confidence are routed to a human.
    pub confidence_threshold: f64,
    pub max_candidates_per_channel: usize,
    pub interviewer: String,
    pub recruiter_name: String,
    pub recruiter_email: String,
    pub company_name: String,
}

impl Default for RecruitingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            max_candidates_per_channel: 50,
            interviewer: "Recruiting Team".to_string(),
            recruiter_name: "Recruiting Team".to_string(),
            recruiter_email: "recruiting@example.com".to_string(),
            company_name: "Our Company".to_string(),
        }
    }
}

impl RecruitingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let confidence_threshold = match env::var("TALENT_CONFIDENCE_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| (0.0..=1.0).contains(value))
                .ok_or(ConfigError::InvalidConfidenceThreshold { value: raw })?,
            Err(_) => defaults.confidence_threshold,
        };

        let max_candidates_per_channel = match env::var("TALENT_MAX_CANDIDATES_PER_CHANNEL") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidCandidateLimit { value: raw })?,
            Err(_) => defaults.max_candidates_per_channel,
        };

        Ok(Self {
            confidence_threshold,
            max_candidates_per_channel,
            interviewer: env::var("TALENT_INTERVIEWER").unwrap_or(defaults.interviewer),
            recruiter_name: env::var("TALENT_RECRUITER_NAME").unwrap_or(defaults.recruiter_name),
            recruiter_email: env::var("TALENT_RECRUITER_EMAIL")
                .unwrap_or(defaults.recruiter_email),
            company_name: env::var("TALENT_COMPANY_NAME").unwrap_or(defaults.company_name),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidConfidenceThreshold { value: String },
    InvalidCandidateLimit { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidConfidenceThreshold { value } => write!(
                f,
                "TALENT_CONFIDENCE_THRESHOLD must be a number between 0 and 1 (got '{value}')"
            ),
            ConfigError::InvalidCandidateLimit { value } => write!(
                f,
                "TALENT_MAX_CANDIDATES_PER_CHANNEL must be a positive integer (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidConfidenceThreshold { .. }
            | ConfigError::InvalidCandidateLimit { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "TALENT_CONFIDENCE_THRESHOLD",
            "TALENT_MAX_CANDIDATES_PER_CHANNEL",
            "TALENT_INTERVIEWER",
            "TALENT_RECRUITER_NAME",
            "TALENT_RECRUITER_EMAIL",
            "TALENT_COMPANY_NAME",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.recruiting, RecruitingConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_recruiting_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TALENT_CONFIDENCE_THRESHOLD", "0.55");
        env::set_var("TALENT_MAX_CANDIDATES_PER_CHANNEL", "12");
        env::set_var("TALENT_INTERVIEWER", "Dana Whitfield");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.recruiting.confidence_threshold, 0.55);
        assert_eq!(config.recruiting.max_candidates_per_channel, 12);
        assert_eq!(config.recruiting.interviewer, "Dana Whitfield");
    }

    #[test]
    fn rejects_confidence_threshold_outside_unit_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TALENT_CONFIDENCE_THRESHOLD", "1.4");

        let err = AppConfig::load().expect_err("threshold above 1 is rejected");
        reset_env();

        assert!(matches!(
            err,
            ConfigError::InvalidConfidenceThreshold { ref value } if value == "1.4"
        ));
    }

    #[test]
    fn rejects_zero_candidate_limit() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TALENT_MAX_CANDIDATES_PER_CHANNEL", "0");

        let err = AppConfig::load().expect_err("zero limit is rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidCandidateLimit { .. }));
    }
}
