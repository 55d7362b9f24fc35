pub mod credentials;
pub mod error;
pub mod service;
pub mod token;

pub use credentials::AdminCredentials;
pub use error::{AuthError, Result};
pub use service::{AdminSessionService, SessionConfig};
pub use token::{generate_session_token, hash_token, TOKEN_BYTES};
