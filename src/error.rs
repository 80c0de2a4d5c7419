use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("GitHub data error: {0}")]
    UpstreamDataError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Port authentication failed: {0}")]
    AuthError(String),

    #[error("Port rejected the upsert (status {status}): {body}")]
    CatalogWriteError { status: u16, body: String },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;

pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> SyncResult<T>;
    fn with_context<F>(self, f: F) -> SyncResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn context(self, msg: &str) -> SyncResult<T> {
        self.map_err(|e| SyncError::UpstreamDataError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> SyncResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SyncError::UpstreamDataError(format!("{}: {}", f(), e)))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, msg: &str) -> SyncResult<T> {
        self.ok_or_else(|| SyncError::UpstreamDataError(msg.to_string()))
    }

    fn with_context<F>(self, f: F) -> SyncResult<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| SyncError::UpstreamDataError(f()))
    }
}

impl SyncError {
    /// Short name of the error class, used in the log file.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::ConfigError(_) => "config",
            SyncError::UpstreamDataError(_) | SyncError::JsonError(_) => "upstream-data",
            SyncError::TransportError(_) | SyncError::RequestError(_) | SyncError::IoError(_) => {
                "transport"
            }
            SyncError::AuthError(_) => "auth",
            SyncError::CatalogWriteError { .. } => "catalog-write",
            SyncError::InvariantViolation(_) => "invariant",
        }
    }
}

#[macro_export]
macro_rules! sync_error {
    ($error_type:ident, $msg:expr) => {
        $crate::error::SyncError::$error_type($msg.to_string())
    };
    ($error_type:ident, $fmt:expr, $($arg:tt)*) => {
        $crate::error::SyncError::$error_type(format!($fmt, $($arg)*))
    };
}
