// Message history and optimistic sends for ChatController

use log::{debug, info};

use crate::backend::ChatBackend;
use crate::chat::error::{reason_or, ChatError, LOAD_MESSAGES_FALLBACK, SEND_MESSAGE_FALLBACK};
use crate::chat::events::ChatEvent;
use crate::chat::ChatController;
use crate::models::Message;

impl<B: ChatBackend + 'static> ChatController<B> {
    /// Fetch the conversation for `contact_id`.
    ///
    /// The result is applied to that contact's thread even if another contact
    /// has been selected in the meantime.
    pub fn load_messages(&mut self, contact_id: &str) {
        let backend = self.backend.clone();
        let contact_id = contact_id.to_string();

        self.spawn("fetch messages", async move {
            match backend.fetch_messages(&contact_id).await {
                Ok(messages) => Some(ChatEvent::MessagesLoaded {
                    contact_id,
                    messages,
                }),
                Err(e) => {
                    let error = ChatError::LoadMessagesFailed {
                        contact_id: contact_id.clone(),
                        message: reason_or(&e.to_string(), LOAD_MESSAGES_FALLBACK),
                    };
                    Some(ChatEvent::MessagesLoadFailed {
                        contact_id,
                        message: error.to_string(),
                    })
                }
            }
        });
    }

    /// Send `text` to the selected contact.
    ///
    /// The message shows up immediately with status `Sending` under a temporary
    /// id, which is returned. When the backend answers it is either replaced by
    /// the stored message or removed again. Blank text or no selection is a
    /// no-op and returns `None`.
    pub fn send(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring send of blank text");
            return None;
        }
        let Some(contact_id) = self.state().selected().map(str::to_string) else {
            debug!("Ignoring send without a selected contact");
            return None;
        };

        if self.state().error().is_some() {
            self.record(ChatEvent::ErrorCleared);
        }

        let provisional = Message::provisional(&contact_id, text);
        let temp_id = provisional.id.clone();
        info!("Sending {} to contact {}", temp_id, contact_id);

        self.record(ChatEvent::MessageSendStarted {
            contact_id: contact_id.clone(),
            message: provisional,
        });

        let backend = self.backend.clone();
        let text = text.to_string();
        let pending_id = temp_id.clone();
        self.spawn("send message", async move {
            match backend.send_message(&contact_id, &text).await {
                Ok(message) => {
                    info!("Message {} acknowledged as {}", pending_id, message.id);
                    Some(ChatEvent::MessageSendSucceeded {
                        contact_id,
                        temp_id: pending_id,
                        message,
                    })
                }
                Err(e) => {
                    let error = ChatError::SendMessageFailed(reason_or(&e.to_string(), SEND_MESSAGE_FALLBACK));
                    Some(ChatEvent::MessageSendFailed {
                        contact_id,
                        temp_id: pending_id,
                        error: error.to_string(),
                    })
                }
            }
        });

        Some(temp_id)
    }
}
