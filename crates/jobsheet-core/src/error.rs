use thiserror::Error;

/// Application-wide error types for jobsheet.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page load or readiness wait exceeded its deadline.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Network/connection error (DNS, refused, reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Browser navigation failed.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The readiness selector never appeared on the page.
    #[error("Selector '{selector}' not found on {url}")]
    SelectorNotFound { selector: String, url: String },

    /// URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A configured CSS selector does not compile.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Headless browser could not be configured or launched.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Fetch attempted after the session was closed.
    #[error("Browser session already closed")]
    SessionClosed,

    /// A transient failure persisted through every allowed attempt.
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    /// Spreadsheet rendering failed.
    #[error("Report error: {0}")]
    ReportError(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Timeout(_)
            | AppError::NetworkError(_)
            | AppError::Navigation(_)
            | AppError::SelectorNotFound { .. } => true,
            AppError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Number of attempts made, if this error came out of the retrier.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            AppError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
