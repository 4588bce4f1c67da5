use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Boxed cause attached to [`AccountError::Upstream`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid or expired activation code")]
    InvalidOrExpired,

    #[error("Credential mismatch")]
    Mismatch,

    #[error("User is not activated")]
    NotActivated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{step} failed: {source}")]
    Upstream {
        step: &'static str,
        #[source]
        source: BoxError,
    },
}

impl AccountError {
    /// Build a `map_err` adapter that wraps a collaborator failure with the
    /// workflow step it happened in.
    pub fn upstream<E>(step: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<BoxError>,
    {
        move |err| {
            let source = err.into();
            tracing::error!(step, error = %source, "Upstream call failed");
            AccountError::Upstream { step, source }
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AccountError::AlreadyExists => "already_exists",
            AccountError::NotFound(_) => "not_found",
            AccountError::InvalidOrExpired => "invalid_or_expired",
            AccountError::Mismatch => "mismatch",
            AccountError::NotActivated => "not_activated",
            AccountError::Validation(_) => "validation",
            AccountError::Upstream { .. } => "upstream",
        }
    }

    /// The failing step for upstream errors
    pub fn step(&self) -> Option<&'static str> {
        match self {
            AccountError::Upstream { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AccountError {
    fn from(err: validator::ValidationErrors) -> Self {
        AccountError::Validation(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("duplicate key violates constraint {constraint}")]
    DuplicateKey { constraint: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_duplicate_of(&self, name: &str) -> bool {
        matches!(self, StoreError::DuplicateKey { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateKey {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}
