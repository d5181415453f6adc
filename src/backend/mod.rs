// Messaging backend seam.
// The core only knows these four operations; how they reach a server (or don't)
// is up to the implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Contact, Message};

pub mod fixtures;
pub mod mock;

pub use mock::{MockBackend, MockLatency, Operation};

/// Failure reported by a backend call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("{0}")]
    Failed(String),

    #[error("{0} timed out")]
    TimedOut(String),
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Full contact list, in display order
    async fn fetch_contacts(&self) -> Result<Vec<Contact>, BackendError>;

    /// Conversation with one contact, oldest first
    async fn fetch_messages(&self, contact_id: &str) -> Result<Vec<Message>, BackendError>;

    /// Deliver `text` and return the stored message with its final id
    async fn send_message(&self, contact_id: &str, text: &str) -> Result<Message, BackendError>;

    async fn mark_as_read(&self, contact_id: &str) -> Result<(), BackendError>;
}
