// Core modules
pub mod api;
pub mod session;

// Re-export commonly used types
pub use api::{
    ActiveSessionResponse, CurrentSessionResponse, ErrorResponse, LoginRequest, LoginResponse,
    LogoutRequest, LogoutResponse, VerifyRequest, VerifyResponse,
};
pub use session::{AdminSession, NewAdminSession};
