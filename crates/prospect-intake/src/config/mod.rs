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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub smtp: Option<SmtpConfig>,
    pub notifications: NotificationConfig,
    pub auth: AuthConfig,
    pub seed_attorneys: Vec<SeedAttorney>,
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

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://prospects.db".to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidPoolSize)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            smtp: SmtpConfig::from_env()?,
            notifications: NotificationConfig {
                organization: non_empty_var("NOTIFY_ORGANIZATION")
                    .unwrap_or_else(|| "our team".to_string()),
            },
            auth: AuthConfig::from_env()?,
            seed_attorneys: SeedAttorney::from_env(environment),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Relational store connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Outbound mail relay. Absent when host or credentials are not configured.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(host), Some(username), Some(password)) = (
            non_empty_var("SMTP_HOST"),
            non_empty_var("SMTP_USER"),
            non_empty_var("SMTP_PASS"),
        ) else {
            return Ok(None);
        };

        let port = match non_empty_var("SMTP_PORT") {
            Some(raw) => raw
                .trim_matches('"')
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidSmtpPort)?,
            None => 587,
        };
        let from = non_empty_var("SMTP_FROM").unwrap_or_else(|| username.clone());

        Ok(Some(Self {
            host,
            port,
            username,
            password,
            from,
        }))
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// Copy used when composing notification bodies.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub organization: String,
}

/// Which credential check guards the admin routes.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Attorneys log in with their email and bcrypt-hashed password.
    Attorney,
    /// A single fixed username/password pair.
    Admin { username: String, password: String },
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = env::var("AUTH_MODE").unwrap_or_else(|_| "attorney".to_string());
        match mode.trim().to_ascii_lowercase().as_str() {
            "attorney" => Ok(Self::Attorney),
            "admin" => match (non_empty_var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
                (Some(username), Ok(password)) if !password.is_empty() => {
                    Ok(Self::Admin { username, password })
                }
                _ => Err(ConfigError::MissingAdminCredentials),
            },
            _ => Err(ConfigError::InvalidAuthMode(mode)),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Attorney => write!(f, "Attorney"),
            AuthConfig::Admin { username, .. } => f
                .debug_struct("Admin")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Attorney account created by the startup seed when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAttorney {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SeedAttorney {
    fn from_env(environment: AppEnvironment) -> Vec<Self> {
        if let (Some(email), Some(password)) = (
            non_empty_var("SEED_ATTORNEY_EMAIL"),
            non_empty_var("SEED_ATTORNEY_PASSWORD"),
        ) {
            let name =
                non_empty_var("SEED_ATTORNEY_NAME").unwrap_or_else(|| "Default Attorney".to_string());
            return vec![Self {
                name,
                email,
                password,
            }];
        }

        if environment == AppEnvironment::Production {
            return Vec::new();
        }

        vec![Self {
            name: "Alex Morgan".to_string(),
            email: "hello@example.com".to_string(),
            password: "pw1".to_string(),
        }]
    }
}

impl fmt::Debug for SeedAttorney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAttorney")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPoolSize,
    InvalidSmtpPort,
    InvalidAuthMode(String),
    MissingAdminCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPoolSize => {
                write!(f, "DATABASE_MAX_CONNECTIONS must be a positive integer")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::InvalidAuthMode(mode) => {
                write!(f, "AUTH_MODE '{}' must be 'attorney' or 'admin'", mode)
            }
            ConfigError::MissingAdminCredentials => write!(
                f,
                "AUTH_MODE=admin requires ADMIN_USERNAME and ADMIN_PASSWORD"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
