// Contact list, selection and read receipts for ChatController

use log::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::chat::error::{reason_or, ChatError, LOAD_CONTACTS_FALLBACK};
use crate::chat::events::ChatEvent;
use crate::chat::ChatController;

impl<B: ChatBackend + 'static> ChatController<B> {
    /// Fetch the contact list. Only the first call per session does anything.
    pub fn start(&mut self) {
        if self.started {
            warn!("Session already started, ignoring start request");
            return;
        }
        self.started = true;
        info!("Starting chat session");
        self.request_contacts();
    }

    /// Fetch the contact list again on user request
    pub fn refresh_contacts(&mut self) {
        info!("Refreshing contact list");
        self.request_contacts();
    }

    fn request_contacts(&mut self) {
        self.record(ChatEvent::ContactsRequested);

        let backend = self.backend.clone();
        self.spawn("fetch contacts", async move {
            match backend.fetch_contacts().await {
                Ok(contacts) => {
                    info!("Fetched {} contacts", contacts.len());
                    Some(ChatEvent::ContactsLoaded(contacts))
                }
                Err(e) => {
                    let error = ChatError::LoadContactsFailed(reason_or(
                        &e.to_string(),
                        LOAD_CONTACTS_FALLBACK,
                    ));
                    Some(ChatEvent::ContactsLoadFailed(error.to_string()))
                }
            }
        });
    }

    /// Select a contact, then load its conversation and mark it read.
    ///
    /// Selecting an id that is not in the contact list fails with
    /// [`ChatError::InvalidSelection`]; the error is also put in the error slot
    /// and the current selection stays as it was.
    pub fn select_contact(&mut self, contact_id: &str) -> Result<(), ChatError> {
        // Any user interaction dismisses the previous error
        if self.state().error().is_some() {
            self.record(ChatEvent::ErrorCleared);
        }

        if let Err(e) = self
            .store
            .apply(ChatEvent::ContactSelected(contact_id.to_string()))
        {
            warn!("Rejected selection of {}: {}", contact_id, e);
            self.record(ChatEvent::ErrorRaised(e.to_string()));
            return Err(e);
        }

        info!("Contact {} selected", contact_id);
        self.open_thread(contact_id);
        Ok(())
    }

    // History and read receipt run side by side, neither waits for the other
    pub(crate) fn open_thread(&mut self, contact_id: &str) {
        self.load_messages(contact_id);
        self.mark_read(contact_id);
    }

    /// Tell the backend the conversation was read. Failures are logged and
    /// otherwise ignored.
    pub fn mark_read(&mut self, contact_id: &str) {
        let backend = self.backend.clone();
        let contact_id = contact_id.to_string();

        self.spawn("mark as read", async move {
            match backend.mark_as_read(&contact_id).await {
                Ok(()) => Some(ChatEvent::ContactMarkedRead(contact_id)),
                Err(e) => {
                    debug!("{} ({})", ChatError::MarkReadFailed(contact_id), e);
                    None
                }
            }
        });
    }

    pub fn clear_error(&mut self) {
        self.record(ChatEvent::ErrorCleared);
    }
}
