use thiserror::Error;

/// Machine-readable error codes surfaced to API clients.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DUPLICATE_PENDING_REQUEST: &str = "DUPLICATE_PENDING_REQUEST";
    pub const PROFILE_ALREADY_EXISTS: &str = "PROFILE_ALREADY_EXISTS";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const UPGRADE_REQUEST_NOT_FOUND: &str = "UPGRADE_REQUEST_NOT_FOUND";
    pub const PROFILE_NOT_FOUND: &str = "PROFILE_NOT_FOUND";
    pub const REQUEST_ALREADY_REVIEWED: &str = "REQUEST_ALREADY_REVIEWED";
    pub const STORAGE_FAILURE: &str = "STORAGE_FAILURE";
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    InvalidState { message: String },

    #[error("storage failure: {message}")]
    Database { message: String },
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        MarketError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MarketError::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        MarketError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        MarketError::InvalidState {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        MarketError::Database {
            message: message.into(),
        }
    }

    /// Stable error code string for the API envelope.
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Validation { .. } => codes::VALIDATION_ERROR,
            MarketError::Conflict { code, .. } => code,
            MarketError::Forbidden { .. } => codes::FORBIDDEN,
            MarketError::NotFound { code, .. } => code,
            MarketError::InvalidState { .. } => codes::REQUEST_ALREADY_REVIEWED,
            MarketError::Database { .. } => codes::STORAGE_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
