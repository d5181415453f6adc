use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Prefix carried by every locally generated, not yet acknowledged message id.
pub const TEMP_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub phone_number: String,
    pub last_message: String,
    pub timestamp: String,
    pub unread: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

impl Contact {
    pub fn new(id: &str, phone_number: &str, last_message: &str, timestamp: &str, unread: u32) -> Self {
        Contact {
            id: id.to_string(),
            phone_number: phone_number.to_string(),
            last_message: last_message.to_string(),
            timestamp: timestamp.to_string(),
            unread,
            is_online: None,
            last_seen: None,
        }
    }

    /// Two-character avatar label taken from the tail of the phone number
    pub fn initials(&self) -> String {
        let chars: Vec<char> = self.phone_number.chars().collect();
        if chars.len() < 4 {
            return self.phone_number.clone();
        }
        chars[chars.len() - 4..chars.len() - 2].iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Them,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sending = 1,   // Optimistic, not yet acknowledged
    Sent = 2,      // Acknowledged by the backend
    Delivered = 3, // Reached the remote party
    Read = 4,      // Read by the remote party
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
    pub contact_id: String,
    // Only meaningful for messages we authored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
}

impl Message {
    /// Build the optimistic copy of an outgoing message.
    ///
    /// The id is freshly generated and carries [`TEMP_ID_PREFIX`] so it can never
    /// collide with a backend-assigned id.
    pub fn provisional(contact_id: &str, text: &str) -> Self {
        Message {
            id: format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4()),
            text: text.trim().to_string(),
            sender: Sender::Me,
            timestamp: display_time(Local::now()),
            contact_id: contact_id.to_string(),
            status: Some(DeliveryStatus::Sending),
            kind: MessageKind::Text,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    pub fn is_outgoing(&self) -> bool {
        self.sender == Sender::Me
    }
}

/// Format an instant the way message and contact timestamps are displayed ("2:30 PM").
pub fn display_time(at: DateTime<Local>) -> String {
    at.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_contact_initials() {
        let contact = Contact::new("1", "+1 (555) 123-4567", "Hey", "2:30 PM", 2);
        assert_eq!(contact.initials(), "45");

        let short = Contact::new("2", "12", "", "", 0);
        assert_eq!(short.initials(), "12");
    }

    #[test]
    fn test_provisional_message() {
        let msg = Message::provisional("2", "  hello  ");

        assert!(msg.is_provisional());
        assert!(msg.is_outgoing());
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.contact_id, "2");
        assert_eq!(msg.status, Some(DeliveryStatus::Sending));

        // Every optimistic send gets its own id
        let other = Message::provisional("2", "hello");
        assert_ne!(msg.id, other.id);
    }

    #[test]
    fn test_display_time() {
        let afternoon = Local.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        assert_eq!(display_time(afternoon), "2:30 PM");

        let morning = Local.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap();
        assert_eq!(display_time(morning), "9:05 AM");
    }

    #[test]
    fn test_message_json_shape() {
        let json = r#"{
            "id": "1",
            "text": "Hey, how are you?",
            "sender": "them",
            "timestamp": "2:25 PM",
            "contactId": "1"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();

        assert_eq!(msg.sender, Sender::Them);
        assert_eq!(msg.status, None);
        assert_eq!(msg.kind, MessageKind::Text);
        assert!(!msg.is_provisional());

        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["contactId"], "1");
        assert_eq!(encoded["type"], "text");
        assert!(encoded.get("status").is_none());
    }
}
