pub mod connection;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use memory::MemorySessionStore;
pub use repositories::admin_sessions::AdminSessionRepository;
pub use store::{CreatedSession, SessionStore};
