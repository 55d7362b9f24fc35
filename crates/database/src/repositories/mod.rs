pub mod admin_sessions;
