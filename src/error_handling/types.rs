use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadAddressFormatting(String),
    BadUrl(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadAddressFormatting(e) => write!(f, "Address formatting error: {}", e),
            ConfigError::BadUrl(e) => write!(f, "Base URL error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

/// Failures of a session store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    ReadFailed(String),
    WriteFailed(String),
    Corrupted(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed(e) => write!(f, "Session store read failed: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Session store write failed: {}", e),
            StorageError::Corrupted(e) => write!(f, "Session store corrupted: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

/// Everything a caller of the API access layer can get back instead of data.
///
/// `Clone` because one refresh outcome is handed to every queued caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, DNS, ...).
    Network(String),
    /// HTTP 401, or a token refresh that could not produce a new token.
    AuthExpired(String),
    /// HTTP 403.
    PermissionDenied(String),
    /// Any other 4xx.
    Validation { status: u16, message: String },
    /// 5xx.
    Server { status: u16, message: String },
    /// Informational or redirect statuses the client does not follow.
    Unexpected { status: u16 },
    /// HTTP 2xx carrying an envelope whose `code` is not a success code.
    Rejected { code: i64, message: String },
    /// The body could not be decoded into the expected shape.
    Decode(String),
    Storage(StorageError),
}

impl ApiError {
    /// Maps a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ApiError::AuthExpired(message),
            403 => ApiError::PermissionDenied(message),
            400..=499 => ApiError::Validation { status, message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Unexpected { status },
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e) => write!(f, "Network failure: {}", e),
            ApiError::AuthExpired(e) => write!(f, "Authentication expired: {}", e),
            ApiError::PermissionDenied(e) => write!(f, "Permission denied: {}", e),
            ApiError::Validation { status, message } => {
                write!(f, "Request rejected ({}): {}", status, message)
            }
            ApiError::Server { status, message } => {
                write!(f, "Server fault ({}): {}", status, message)
            }
            ApiError::Unexpected { status } => write!(f, "Unexpected HTTP status {}", status),
            ApiError::Rejected { code, message } => {
                write!(f, "Business error (code {}): {}", code, message)
            }
            ApiError::Decode(e) => write!(f, "Malformed response: {}", e),
            ApiError::Storage(e) => write!(f, "Session storage error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

#[derive(Debug)]
pub enum WebError {
    BadBindAddress(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BadBindAddress(e) => write!(f, "Invalid bind address: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

/// Refusals of the mock server's user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    MissingFields,
    InvalidRole(String),
    InvalidStatus,
    InvalidIdList,
    UserNotFound,
    UsernameTaken,
    EmailTaken,
    EmailInUse,
    BadCredentials,
    AccountDisabled,
    RoleMismatch,
    Unauthorized(String),
}

impl DirectoryError {
    /// Status carried both as the HTTP status and as the envelope `code`.
    pub fn status(&self) -> u16 {
        match self {
            DirectoryError::MissingFields
            | DirectoryError::InvalidRole(_)
            | DirectoryError::InvalidStatus
            | DirectoryError::InvalidIdList => 400,
            DirectoryError::BadCredentials | DirectoryError::Unauthorized(_) => 401,
            DirectoryError::AccountDisabled | DirectoryError::RoleMismatch => 403,
            DirectoryError::UserNotFound => 404,
            DirectoryError::UsernameTaken
            | DirectoryError::EmailTaken
            | DirectoryError::EmailInUse => 409,
        }
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::MissingFields => write!(f, "Missing required fields"),
            DirectoryError::InvalidRole(role) => write!(f, "Invalid role `{}`", role),
            DirectoryError::InvalidStatus => write!(f, "Invalid status value"),
            DirectoryError::InvalidIdList => write!(f, "Invalid user id list"),
            DirectoryError::UserNotFound => write!(f, "User not found"),
            DirectoryError::UsernameTaken => write!(f, "Username already exists"),
            DirectoryError::EmailTaken => write!(f, "Email already exists"),
            DirectoryError::EmailInUse => write!(f, "Email is used by another user"),
            DirectoryError::BadCredentials => write!(f, "Wrong username or password"),
            DirectoryError::AccountDisabled => write!(f, "Account is disabled"),
            DirectoryError::RoleMismatch => write!(f, "User role does not match"),
            DirectoryError::Unauthorized(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DirectoryError {}
