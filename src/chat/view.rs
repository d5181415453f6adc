// Derived, read-only views over the session state.
// Nothing in here mutates state; the store calls `summarize` after every
// message-list change and presentation renders from `ChatSnapshot`.

use crate::chat::store::SessionState;
use crate::models::Message;

/// Placeholder summary for a contact whose conversation is empty
pub const NO_MESSAGES_YET: &str = "No messages yet";

/// The summary line shown under a contact in the contact list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub timestamp: String,
}

/// Summarize a conversation from its last message.
///
/// An empty conversation yields [`NO_MESSAGES_YET`] and keeps the timestamp the
/// contact already had.
pub fn summarize(messages: &[Message], previous_timestamp: &str) -> Summary {
    match messages.last() {
        Some(last) => Summary {
            text: last.text.clone(),
            timestamp: last.timestamp.clone(),
        },
        None => Summary {
            text: NO_MESSAGES_YET.to_string(),
            timestamp: previous_timestamp.to_string(),
        },
    }
}

/// Last message text for a contact: the loaded conversation wins, then the
/// value supplied with the contact list, then the placeholder.
pub fn last_message_for(state: &SessionState, contact_id: &str) -> String {
    if let Some(last) = state.messages(contact_id).and_then(|m| m.last()) {
        return last.text.clone();
    }
    match state.contact(contact_id) {
        Some(contact) if !contact.last_message.is_empty() => contact.last_message.clone(),
        _ => NO_MESSAGES_YET.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactRow {
    pub id: String,
    pub phone_number: String,
    pub initials: String,
    pub last_message: String,
    pub timestamp: String,
    pub unread: u32,
    pub is_selected: bool,
    pub is_online: bool,
    pub last_seen: Option<String>,
}

/// Everything presentation needs to render one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    pub contacts: Vec<ContactRow>,
    pub selected_contact: Option<ContactRow>,
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
    pub can_send: bool,
}

impl ChatSnapshot {
    pub fn from_state(state: &SessionState) -> Self {
        let selected = state.selected();

        let contacts: Vec<ContactRow> = state
            .contacts()
            .map(|contact| ContactRow {
                id: contact.id.clone(),
                phone_number: contact.phone_number.clone(),
                initials: contact.initials(),
                last_message: contact.last_message.clone(),
                timestamp: contact.timestamp.clone(),
                unread: contact.unread,
                is_selected: selected == Some(contact.id.as_str()),
                is_online: contact.is_online.unwrap_or(false),
                last_seen: contact.last_seen.clone(),
            })
            .collect();

        let selected_contact = contacts.iter().find(|row| row.is_selected).cloned();

        // Selection only decides what is displayed, never which list gets updated
        let messages = selected
            .and_then(|id| state.messages(id))
            .map(|m| m.to_vec())
            .unwrap_or_default();

        ChatSnapshot {
            contacts,
            selected_contact,
            messages,
            loading: state.is_loading(),
            error: state.error().map(str::to_string),
            can_send: selected.is_some() && !state.is_loading(),
        }
    }
}
