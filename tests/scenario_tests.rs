// End-to-end session scenarios
// Each test drives a ChatController against the mock backend and checks what
// presentation would see at every step.

mod common;
use common::{contact, fixture, incoming, instant_backend_with, setup_logging, started};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::info;

use chatsync::backend::{MockBackend, MockLatency, Operation};
use chatsync::chat::{ChatController, ChatEvent};
use chatsync::models::DeliveryStatus;

/// Contacts load, the first one is opened, and its unread badge only clears
/// once the backend confirms the read receipt.
#[tokio::test]
async fn test_first_contact_opens_and_clears_unread() -> Result<()> {
    setup_logging();
    let backend = instant_backend_with(fixture(vec![contact("1", "Hi", "2:30 PM", 2)], vec![]));
    let mut controller = ChatController::new(backend.clone());

    controller.start();
    assert!(controller.snapshot().loading);

    let mut saw_contacts = false;
    let mut saw_read = false;
    while let Some(event) = controller.next_event().await {
        let unread = controller.state().contact("1").map(|c| c.unread);
        match event {
            ChatEvent::ContactsLoaded(_) => {
                saw_contacts = true;
                assert_eq!(controller.state().selected(), Some("1"));
                assert_eq!(unread, Some(2));
            }
            ChatEvent::ContactMarkedRead(_) => {
                saw_read = true;
                assert_eq!(unread, Some(0));
            }
            _ => {
                if !saw_read {
                    assert_eq!(unread, Some(2));
                }
            }
        }
    }

    assert!(saw_contacts && saw_read);
    assert!(!controller.snapshot().loading);
    assert_eq!(backend.call_count(Operation::MarkAsRead), 1);
    Ok(())
}

/// An optimistic send shows up at once and is swapped for the stored message.
#[tokio::test]
async fn test_send_is_shown_then_committed() -> Result<()> {
    let backend = instant_backend_with(fixture(
        vec![contact("1", "Hi", "2:30 PM", 0), contact("2", "", "1:45 PM", 0)],
        vec![("1", vec![incoming("1", "1", "Hi", "2:30 PM")])],
    ));
    let mut controller = started(backend).await;
    controller.select_contact("2")?;
    controller.settle().await;
    assert!(controller.snapshot().messages.is_empty());

    let temp_id = controller.send("hello").expect("send should be dispatched");

    // Before the backend answers
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].id, temp_id);
    assert_eq!(snapshot.messages[0].text, "hello");
    assert_eq!(snapshot.messages[0].status, Some(DeliveryStatus::Sending));

    controller.settle().await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.messages.len(), 1);
    let sent = &snapshot.messages[0];
    assert_eq!(sent.id, "m1");
    assert_eq!(sent.text, "hello");
    assert_eq!(sent.status, Some(DeliveryStatus::Sent));

    let summary = controller.state().contact("2").expect("contact 2");
    assert_eq!(summary.last_message, "hello");
    assert_eq!(summary.timestamp, sent.timestamp);
    Ok(())
}

/// A rejected send disappears again and the reason lands in the error slot.
#[tokio::test]
async fn test_failed_send_is_rolled_back() -> Result<()> {
    let backend = instant_backend_with(fixture(
        vec![contact("1", "Hi", "2:30 PM", 0), contact("2", "", "1:45 PM", 0)],
        vec![],
    ));
    backend.fail(Operation::SendMessage, "network error");

    let mut controller = started(backend).await;
    controller.select_contact("2")?;
    controller.settle().await;

    controller.send("hello");
    assert_eq!(controller.snapshot().messages.len(), 1);

    controller.settle().await;

    let snapshot = controller.snapshot();
    assert!(snapshot.messages.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("network error"));
    assert_eq!(controller.state().pending_sends().count(), 0);
    Ok(())
}

/// Switching contacts while the previous history is still loading: the late
/// result fills in its own contact but does not change what is displayed.
#[tokio::test]
async fn test_late_history_does_not_replace_displayed_thread() -> Result<()> {
    setup_logging();
    let backend = Arc::new(
        MockBackend::new(fixture(
            vec![contact("1", "Hi", "2:30 PM", 0), contact("2", "Yo", "1:45 PM", 0)],
            vec![
                ("1", vec![incoming("1", "a", "Hi", "2:30 PM")]),
                ("2", vec![incoming("2", "b", "Yo", "1:45 PM"), incoming("2", "c", "Later", "1:50 PM")]),
            ],
        ))
        .with_latency(MockLatency::none()),
    );
    backend.set_message_latency("1", Duration::from_millis(150));
    backend.set_message_latency("2", Duration::from_millis(10));

    let mut controller = ChatController::new(backend.clone());
    controller.start();

    // Contacts arrive and contact 1 starts loading
    loop {
        match controller.next_event().await {
            Some(ChatEvent::ContactsLoaded(_)) => break,
            Some(_) => continue,
            None => panic!("contacts never loaded"),
        }
    }
    assert_eq!(controller.state().selected(), Some("1"));

    controller.select_contact("2")?;

    let mut history_order = Vec::new();
    while let Some(event) = controller.next_event().await {
        if let ChatEvent::MessagesLoaded { contact_id, .. } = event {
            info!("History for {} applied", contact_id);
            history_order.push(contact_id.clone());

            // Whatever just landed, contact 2 stays on screen
            let snapshot = controller.snapshot();
            assert_eq!(snapshot.selected_contact.map(|c| c.id), Some("2".to_string()));
            if history_order.len() == 2 {
                assert_eq!(snapshot.messages.len(), 2);
            }
        }
    }

    assert_eq!(history_order, vec!["2".to_string(), "1".to_string()]);
    assert_eq!(controller.state().messages("1").map(|m| m.len()), Some(1));
    assert_eq!(controller.state().contact("1").map(|c| c.last_message.clone()), Some("Hi".to_string()));
    assert_eq!(controller.state().contact("2").map(|c| c.last_message.clone()), Some("Later".to_string()));

    let displayed: Vec<String> = controller.snapshot().messages.iter().map(|m| m.id.clone()).collect();
    assert_eq!(displayed, vec!["b".to_string(), "c".to_string()]);
    Ok(())
}

/// The contact list summary always mirrors the last message of a loaded thread.
#[tokio::test]
async fn test_summaries_match_thread_tails() -> Result<()> {
    let backend = instant_backend_with(common::seeded_fixture());
    let mut controller = started(backend.clone()).await;

    for id in ["2", "3", "4"] {
        controller.select_contact(id)?;
    }
    controller.settle().await;
    controller.send("one more thing");
    controller.settle().await;

    for contact in controller.state().contacts() {
        if let Some(last) = controller.state().messages(&contact.id).and_then(|m| m.last()) {
            assert_eq!(contact.last_message, last.text, "summary of {}", contact.id);
            assert_eq!(contact.timestamp, last.timestamp, "timestamp of {}", contact.id);
        }
    }
    // Contact 5 was never opened and keeps its fetched summary
    let untouched = controller.state().contact("5").expect("contact 5");
    assert_eq!(untouched.last_message, "Great job on the project!");
    assert_eq!(untouched.timestamp, "Yesterday");
    Ok(())
}
