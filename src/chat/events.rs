use crate::models::{Contact, Message};

/// Everything that can change the session state.
///
/// Events carry the contact id they were issued for. The store applies them to
/// that contact's entry no matter which contact is selected when they arrive.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    ContactsRequested,
    ContactsLoaded(Vec<Contact>),
    ContactsLoadFailed(String),
    ContactSelected(String),
    MessagesLoaded {
        contact_id: String,
        messages: Vec<Message>,
    },
    MessagesLoadFailed {
        contact_id: String,
        message: String,
    },
    MessageSendStarted {
        contact_id: String,
        message: Message,
    },
    MessageSendSucceeded {
        contact_id: String,
        temp_id: String,
        message: Message,
    },
    MessageSendFailed {
        contact_id: String,
        temp_id: String,
        error: String,
    },
    ContactMarkedRead(String),
    ErrorRaised(String),
    ErrorCleared,
}

impl ChatEvent {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::ContactsRequested => "ContactsRequested",
            ChatEvent::ContactsLoaded(_) => "ContactsLoaded",
            ChatEvent::ContactsLoadFailed(_) => "ContactsLoadFailed",
            ChatEvent::ContactSelected(_) => "ContactSelected",
            ChatEvent::MessagesLoaded { .. } => "MessagesLoaded",
            ChatEvent::MessagesLoadFailed { .. } => "MessagesLoadFailed",
            ChatEvent::MessageSendStarted { .. } => "MessageSendStarted",
            ChatEvent::MessageSendSucceeded { .. } => "MessageSendSucceeded",
            ChatEvent::MessageSendFailed { .. } => "MessageSendFailed",
            ChatEvent::ContactMarkedRead(_) => "ContactMarkedRead",
            ChatEvent::ErrorRaised(_) => "ErrorRaised",
            ChatEvent::ErrorCleared => "ErrorCleared",
        }
    }
}
