use spatial_core::{ConfigError, DbError, LoggingError, ServiceError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CLIENT: u8 = 2;

/// Failure of one CLI invocation.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Store(DbError),
    /// Payload is not a JSON object of the expected shape.
    Payload(serde_json::Error),
    Service(ServiceError),
}

impl CliError {
    /// Status reported alongside the message.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Payload(_) => 400,
            Self::Service(err) => err.status_code(),
            Self::Config(_) | Self::Logging(_) | Self::Store(_) => 500,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.status_code() {
            400..=499 => EXIT_CLIENT,
            _ => EXIT_ERROR,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "failed to open store: {err}"),
            Self::Payload(err) => write!(f, "invalid JSON payload: {err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value)
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}
