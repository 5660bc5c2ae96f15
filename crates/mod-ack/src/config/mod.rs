use crate::activity::strings::KeyScheme;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_TEXT_FILE_AREA: &str = "content";
pub const DEFAULT_FILE_AREA: &str = "attachment";

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub module: ModuleConfig,
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
            module: ModuleConfig::from_env()?,
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

/// Course and plugin settings the record manager would otherwise read from
/// host globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Upload limit of the owning course in bytes. `0` defers to the site limit.
    pub course_maxbytes: u64,
    /// File area receiving files embedded in the rich-text editor.
    pub text_file_area: String,
    /// File area receiving the single uploaded document.
    pub file_area: String,
    pub string_keys: KeyScheme,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            course_maxbytes: 0,
            text_file_area: DEFAULT_TEXT_FILE_AREA.to_string(),
            file_area: DEFAULT_FILE_AREA.to_string(),
            string_keys: KeyScheme::Plain,
        }
    }
}

impl ModuleConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let course_maxbytes = match env::var("ACK_COURSE_MAXBYTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidMaxBytes(raw))?,
            Err(_) => 0,
        };

        let text_file_area = file_area_from_env("ACK_TEXT_FILE_AREA", DEFAULT_TEXT_FILE_AREA)?;
        let file_area = file_area_from_env("ACK_FILE_AREA", DEFAULT_FILE_AREA)?;

        let string_keys = match env::var("ACK_STRING_KEYS") {
            Ok(raw) => KeyScheme::parse(&raw).ok_or(ConfigError::InvalidKeyScheme(raw))?,
            Err(_) => KeyScheme::Plain,
        };

        Ok(Self {
            course_maxbytes,
            text_file_area,
            file_area,
            string_keys,
        })
    }
}

fn file_area_from_env(variable: &'static str, default: &str) -> Result<String, ConfigError> {
    match env::var(variable) {
        Ok(raw) if raw.trim().is_empty() => Err(ConfigError::EmptyFileArea(variable)),
        Ok(raw) => Ok(raw.trim().to_string()),
        Err(_) => Ok(default.to_string()),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMaxBytes(String),
    InvalidKeyScheme(String),
    EmptyFileArea(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMaxBytes(value) => write!(
                f,
                "ACK_COURSE_MAXBYTES must be a non-negative integer (found '{}')",
                value
            ),
            ConfigError::InvalidKeyScheme(value) => write!(
                f,
                "ACK_STRING_KEYS must be 'plain' or 'prefixed' (found '{}')",
                value
            ),
            ConfigError::EmptyFileArea(variable) => {
                write!(f, "{} must not be empty when set", variable)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMaxBytes(_)
            | ConfigError::InvalidKeyScheme(_)
            | ConfigError::EmptyFileArea(_) => None,
        }
    }
}
