use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub scheduler: SchedulerConfig,
    pub documents: DocumentConfig,
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
            scheduler: SchedulerConfig::from_env()?,
            documents: DocumentConfig::from_env()?,
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

/// Cadence and policy tunables for the background sweeps.
///
/// Sweep cadences are operational dials, not correctness properties: the
/// reminder sweep re-evaluates persisted timestamps on every run, so a
/// different period only changes how promptly overdue reminders go out.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub reminder_sweep_hours: u64,
    pub housekeeping_sweep_hours: u64,
    pub confirmation_grace_hours: i64,
    pub default_reminder_interval_days: i64,
}

impl SchedulerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            reminder_sweep_hours: parse_env("REMINDER_SWEEP_HOURS", 6)?,
            housekeeping_sweep_hours: parse_env("HOUSEKEEPING_SWEEP_HOURS", 24)?,
            confirmation_grace_hours: parse_env("CONFIRMATION_GRACE_HOURS", 24)?,
            default_reminder_interval_days: parse_env("DEFAULT_REMINDER_INTERVAL_DAYS", 3)?,
        })
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_sweep_hours: 6,
            housekeeping_sweep_hours: 24,
            confirmation_grace_hours: 24,
            default_reminder_interval_days: 3,
        }
    }
}

/// Upload handling tunables.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub max_document_bytes: usize,
    pub upload_path: PathBuf,
}

impl DocumentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_kb: usize = parse_env("MAX_DOCUMENT_KB", 900)?;
        let upload_path = env::var("UPLOAD_PATH").unwrap_or_else(|_| "./uploads".to_string());
        Ok(Self {
            max_document_bytes: max_kb * 1024,
            upload_path: PathBuf::from(upload_path),
        })
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 900 * 1024,
            upload_path: PathBuf::from("./uploads"),
        }
    }
}

fn parse_env<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
