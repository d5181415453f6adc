pub mod backend; // Messaging backend seam and the mock implementation
pub mod chat; // State store, derivation layer and sync controller
pub mod config;
pub mod models;

// Re-export main types for convenience
pub use backend::{BackendError, ChatBackend, MockBackend};
pub use chat::{ChatController, ChatError, ChatEvent, ChatSnapshot, ChatStore, SessionState};
pub use models::*;
