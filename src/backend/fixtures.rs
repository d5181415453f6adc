use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::models::{Contact, Message, MessageKind, Sender};

/// Data set served by the mock backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: HashMap<String, Vec<Message>>,
}

impl Fixture {
    /// Load a fixture from a JSON file in the `{ "contacts": [...], "messages": {...} }` shape
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)
            .with_context(|| format!("Could not open fixture {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let fixture: Fixture = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid fixture {}", path.display()))?;
        info!(
            "Loaded fixture with {} contacts from {}",
            fixture.contacts.len(),
            path.display()
        );
        Ok(fixture)
    }
}

fn message(contact_id: &str, id: &str, sender: Sender, text: &str, timestamp: &str) -> Message {
    Message {
        id: id.to_string(),
        text: text.to_string(),
        sender,
        timestamp: timestamp.to_string(),
        contact_id: contact_id.to_string(),
        status: None,
        kind: MessageKind::Text,
    }
}

/// Five demo conversations
pub fn seed() -> Fixture {
    use Sender::{Me, Them};

    let contacts = vec![
        Contact::new("1", "+1 (555) 123-4567", "Hey, how are you?", "2:30 PM", 2),
        Contact::new("2", "+1 (555) 987-6543", "See you tomorrow!", "1:45 PM", 0),
        Contact::new("3", "+1 (555) 456-7890", "Thanks for the help", "12:15 PM", 1),
        Contact::new("4", "+1 (555) 321-0987", "Let me know when you arrive", "11:30 AM", 0),
        Contact::new("5", "+1 (555) 654-3210", "Great job on the project!", "Yesterday", 0),
    ];

    let mut messages = HashMap::new();
    messages.insert(
        "1".to_string(),
        vec![
            message("1", "1", Them, "Hey, how are you?", "2:25 PM"),
            message("1", "2", Me, "I'm doing great! How about you?", "2:26 PM"),
            message("1", "3", Them, "Pretty good, just working on some projects", "2:30 PM"),
        ],
    );
    messages.insert(
        "2".to_string(),
        vec![
            message("2", "1", Me, "Are we still meeting tomorrow?", "1:40 PM"),
            message("2", "2", Them, "Yes, at 3 PM right?", "1:42 PM"),
            message("2", "3", Them, "Perfect! See you tomorrow!", "1:45 PM"),
        ],
    );
    messages.insert(
        "3".to_string(),
        vec![
            message("3", "1", Them, "Could you help me with the code review?", "12:10 PM"),
            message("3", "2", Me, "I'll take a look now", "12:12 PM"),
            message("3", "3", Them, "Thanks for the help", "12:15 PM"),
        ],
    );
    messages.insert(
        "4".to_string(),
        vec![
            message("4", "1", Me, "I'm on my way to the office", "11:25 AM"),
            message("4", "2", Them, "Let me know when you arrive", "11:30 AM"),
        ],
    );
    messages.insert(
        "5".to_string(),
        vec![
            message("5", "1", Me, "The presentation went really well!", "Yesterday"),
            message("5", "2", Them, "Great job on the project!", "Yesterday"),
        ],
    );

    Fixture { contacts, messages }
}
