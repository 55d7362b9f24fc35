pub mod admin;
pub mod rate_limit;

pub use admin::{require_admin_session, AdminContext};
pub use rate_limit::{rate_limit_login, LoginRateLimiter};
