#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use mnemo_core::Clock;

pub use error::SessionError;
pub use sessions::{
    DEFAULT_STORAGE_KEY, ListenerId, SessionManager, SessionProgress, SessionStore,
};
