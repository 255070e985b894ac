mod listeners;
mod manager;
mod progress;
mod repository;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use listeners::ListenerId;
pub use manager::SessionManager;
pub use progress::SessionProgress;
pub use repository::{DEFAULT_STORAGE_KEY, SessionStore};
