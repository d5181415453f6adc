// Canonical session state and the single mutation entry point.
// All changes go through `ChatStore::apply`; handlers never block or do I/O.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::chat::error::ChatError;
use crate::chat::events::ChatEvent;
use crate::chat::view::summarize;
use crate::models::{Contact, Message};

/// In-memory snapshot of one client session
#[derive(Debug, Clone)]
pub struct SessionState {
    contact_order: Vec<String>,                // Order the backend delivered them in
    contacts: HashMap<String, Contact>,
    messages: HashMap<String, Vec<Message>>,   // Contact id -> thread, arrival order
    selected: Option<String>,
    loading: bool,
    contact_fetches: usize,                    // Contact fetches requested and not yet answered
    error: Option<String>,
    pending_sends: HashMap<String, String>,    // Temporary id -> contact id
}

impl SessionState {
    /// Fresh state: empty and waiting for the first contact fetch
    pub fn new() -> Self {
        SessionState {
            contact_order: Vec::new(),
            contacts: HashMap::new(),
            messages: HashMap::new(),
            selected: None,
            loading: true,
            contact_fetches: 0,
            error: None,
            pending_sends: HashMap::new(),
        }
    }

    /// Contacts in delivery order
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.contact_order
            .iter()
            .filter_map(move |id| self.contacts.get(id))
    }

    pub fn contact(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.get(contact_id)
    }

    /// Loaded thread for a contact, `None` when it was never fetched
    pub fn messages(&self, contact_id: &str) -> Option<&[Message]> {
        self.messages.get(contact_id).map(Vec::as_slice)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Temporary ids of optimistic sends still waiting for the backend
    pub fn pending_sends(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.pending_sends
            .iter()
            .map(|(temp_id, contact_id)| (temp_id.as_str(), contact_id.as_str()))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of the session state
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    state: SessionState,
}

impl ChatStore {
    pub fn new() -> Self {
        ChatStore {
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one event atomically.
    ///
    /// Only `ContactSelected` can fail; a failed apply leaves the state exactly
    /// as it was.
    pub fn apply(&mut self, event: ChatEvent) -> Result<(), ChatError> {
        debug!("Applying {}", event.name());

        match event {
            ChatEvent::ContactsRequested => {
                self.state.contact_fetches += 1;
                self.state.loading = true;
                self.state.error = None;
            }
            ChatEvent::ContactsLoaded(contacts) => self.replace_contacts(contacts),
            ChatEvent::ContactsLoadFailed(message) => {
                warn!("Contact list failed to load: {}", message);
                self.finish_contact_fetch();
                self.state.error = Some(message);
            }
            ChatEvent::ContactSelected(contact_id) => {
                if !self.state.contacts.contains_key(&contact_id) {
                    return Err(ChatError::InvalidSelection(contact_id));
                }
                self.state.selected = Some(contact_id);
            }
            ChatEvent::MessagesLoaded {
                contact_id,
                messages,
            } => {
                info!("Loaded {} messages for contact {}", messages.len(), contact_id);
                self.state.messages.insert(contact_id.clone(), messages);
                self.resummarize(&contact_id);
            }
            ChatEvent::MessagesLoadFailed {
                contact_id,
                message,
            } => {
                warn!("Messages for contact {} failed to load: {}", contact_id, message);
                self.state.error = Some(message);
            }
            ChatEvent::MessageSendStarted {
                contact_id,
                message,
            } => {
                self.state
                    .pending_sends
                    .insert(message.id.clone(), contact_id.clone());
                self.state
                    .messages
                    .entry(contact_id.clone())
                    .or_default()
                    .push(message);
                self.resummarize(&contact_id);
            }
            ChatEvent::MessageSendSucceeded {
                contact_id,
                temp_id,
                message,
            } => self.commit_send(&contact_id, &temp_id, message),
            ChatEvent::MessageSendFailed {
                contact_id,
                temp_id,
                error,
            } => self.roll_back_send(&contact_id, &temp_id, error),
            ChatEvent::ContactMarkedRead(contact_id) => {
                if let Some(contact) = self.state.contacts.get_mut(&contact_id) {
                    contact.unread = 0;
                }
            }
            ChatEvent::ErrorRaised(message) => self.state.error = Some(message),
            ChatEvent::ErrorCleared => self.state.error = None,
        }

        Ok(())
    }

    fn replace_contacts(&mut self, contacts: Vec<Contact>) {
        let mut order = Vec::with_capacity(contacts.len());
        let mut by_id = HashMap::with_capacity(contacts.len());
        for contact in contacts {
            if by_id.contains_key(&contact.id) {
                warn!("Ignoring duplicate contact id {}", contact.id);
                continue;
            }
            order.push(contact.id.clone());
            by_id.insert(contact.id.clone(), contact);
        }
        info!("Contact list replaced with {} contacts", order.len());

        self.state.contact_order = order;
        self.state.contacts = by_id;

        // Threads we already hold stay authoritative for their summaries
        let loaded: Vec<String> = self.state.messages.keys().cloned().collect();
        for contact_id in loaded {
            self.resummarize(&contact_id);
        }

        if let Some(selected) = &self.state.selected {
            if !self.state.contacts.contains_key(selected) {
                debug!("Selected contact {} disappeared after reload", selected);
                self.state.selected = None;
            }
        }
        if self.state.selected.is_none() {
            self.state.selected = self.state.contact_order.first().cloned();
        }

        self.finish_contact_fetch();
        self.state.error = None;
    }

    // Loading lasts until the last outstanding contact fetch has answered
    fn finish_contact_fetch(&mut self) {
        self.state.contact_fetches = self.state.contact_fetches.saturating_sub(1);
        self.state.loading = self.state.contact_fetches > 0;
        if self.state.loading {
            debug!("{} contact fetches still outstanding", self.state.contact_fetches);
        }
    }

    fn commit_send(&mut self, contact_id: &str, temp_id: &str, message: Message) {
        self.state.pending_sends.remove(temp_id);

        let Some(thread) = self.state.messages.get_mut(contact_id) else {
            debug!("Dropping acknowledgment for {}: no thread for {}", temp_id, contact_id);
            return;
        };
        let Some(position) = thread.iter().position(|m| m.id == temp_id) else {
            debug!("Dropping acknowledgment for {}: no longer in thread {}", temp_id, contact_id);
            return;
        };

        if thread.iter().any(|m| m.id == message.id) {
            // Final copy already present, keep it and discard the provisional one
            thread.remove(position);
        } else {
            thread[position] = message;
        }
        self.resummarize(contact_id);
    }

    fn roll_back_send(&mut self, contact_id: &str, temp_id: &str, error: String) {
        self.state.pending_sends.remove(temp_id);

        if let Some(thread) = self.state.messages.get_mut(contact_id) {
            let before = thread.len();
            thread.retain(|m| m.id != temp_id);
            if thread.len() != before {
                self.resummarize(contact_id);
            } else {
                debug!("Failed send {} was no longer in thread {}", temp_id, contact_id);
            }
        }

        warn!("Send to contact {} failed: {}", contact_id, error);
        self.state.error = Some(error);
    }

    fn resummarize(&mut self, contact_id: &str) {
        let Some(contact) = self.state.contacts.get_mut(contact_id) else {
            debug!("No contact {} to summarize", contact_id);
            return;
        };
        let thread = self
            .state
            .messages
            .get(contact_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let summary = summarize(thread, &contact.timestamp);
        contact.last_message = summary.text;
        contact.timestamp = summary.timestamp;
    }
}
