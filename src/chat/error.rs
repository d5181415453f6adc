use thiserror::Error;

/// Errors produced by the chat core.
///
/// The load and send variants display as the bare reason so the text shown in
/// the error slot is exactly what the backend reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    /// Contact list could not be fetched
    #[error("{0}")]
    LoadContactsFailed(String),

    /// Message history for a contact could not be fetched
    #[error("{message}")]
    LoadMessagesFailed { contact_id: String, message: String },

    /// Backend rejected an outgoing message
    #[error("{0}")]
    SendMessageFailed(String),

    /// Selection of a contact that is not in the contact list
    #[error("Unknown contact: {0}")]
    InvalidSelection(String),

    /// Read receipt could not be delivered. Never written to the error slot.
    #[error("Failed to mark {0} as read")]
    MarkReadFailed(String),
}

pub const LOAD_CONTACTS_FALLBACK: &str = "Failed to load contacts";
pub const LOAD_MESSAGES_FALLBACK: &str = "Failed to load messages";
pub const SEND_MESSAGE_FALLBACK: &str = "Failed to send message";

/// Use the reported reason when there is one, the generic fallback otherwise.
pub(crate) fn reason_or(reason: &str, fallback: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        fallback.to_string()
    } else {
        reason.to_string()
    }
}
