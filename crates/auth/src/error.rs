use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was missing or empty.
    #[error("{0}")]
    ValidationError(String),

    #[error("Credenciales incorrectas")]
    InvalidCredentials,

    #[error("Session store error: {0}")]
    Store(#[from] cyt_database::DatabaseError),
}

impl AuthError {
    pub fn validation(message: &str) -> Self {
        AuthError::ValidationError(message.to_string())
    }
}
