use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server did not answer within the agent's bound.
    #[error("El servidor no respondió a tiempo")]
    Timeout,

    #[error("Error de conexión: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Error de almacenamiento local: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Estado local inválido: {0}")]
    StorageFormat(#[from] serde_json::Error),

    #[error("No hay sesión iniciada")]
    NotAuthenticated,
}

impl ClientError {
    /// Whether the server answered at all. Only answered failures are conclusive.
    pub fn is_server_response(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}
