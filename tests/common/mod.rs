// Common test utilities for integration tests
// This module contains shared code for all integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;

use log::LevelFilter;

use chatsync::backend::fixtures::{self, Fixture};
use chatsync::backend::{MockBackend, MockLatency};
use chatsync::chat::ChatController;
use chatsync::models::{Contact, Message, MessageKind, Sender};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

pub fn contact(id: &str, last_message: &str, timestamp: &str, unread: u32) -> Contact {
    Contact::new(id, &format!("+1 (555) 000-00{:0>2}", id), last_message, timestamp, unread)
}

pub fn incoming(contact_id: &str, id: &str, text: &str, timestamp: &str) -> Message {
    Message {
        id: id.to_string(),
        text: text.to_string(),
        sender: Sender::Them,
        timestamp: timestamp.to_string(),
        contact_id: contact_id.to_string(),
        status: None,
        kind: MessageKind::Text,
    }
}

pub fn fixture(contacts: Vec<Contact>, threads: Vec<(&str, Vec<Message>)>) -> Fixture {
    let messages: HashMap<String, Vec<Message>> = threads
        .into_iter()
        .map(|(id, thread)| (id.to_string(), thread))
        .collect();
    Fixture { contacts, messages }
}

/// Seeded backend that answers immediately
pub fn instant_backend() -> Arc<MockBackend> {
    Arc::new(MockBackend::seeded().with_latency(MockLatency::none()))
}

pub fn instant_backend_with(fixture: Fixture) -> Arc<MockBackend> {
    Arc::new(MockBackend::new(fixture).with_latency(MockLatency::none()))
}

pub fn seeded_fixture() -> Fixture {
    fixtures::seed()
}

/// Controller that has loaded its contacts and opened the first one
pub async fn started(backend: Arc<MockBackend>) -> ChatController<MockBackend> {
    setup_logging();
    let mut controller = ChatController::new(backend);
    controller.start();
    controller.settle().await;
    controller
}

pub fn thread_ids(controller: &ChatController<MockBackend>, contact_id: &str) -> Vec<String> {
    controller
        .state()
        .messages(contact_id)
        .unwrap_or(&[])
        .iter()
        .map(|m| m.id.clone())
        .collect()
}
