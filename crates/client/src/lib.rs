//! Admin dashboard side of the single-admin-session protocol.
//!
//! [`AdminAgent`] owns one device's participation: it keeps a stable device
//! id, logs in, and polls the server so it notices when another device's
//! login has closed its session.

pub mod agent;
pub mod config;
pub mod device;
pub mod error;
pub mod storage;
pub mod transport;

pub use agent::{AdminAgent, AgentEvent, AgentState, KeepaliveHandle, SESSION_CLOSED_MESSAGE};
pub use config::AgentConfig;
pub use error::{ClientError, Result};
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use transport::{HttpSessionApi, SessionApi};
