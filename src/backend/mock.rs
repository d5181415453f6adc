// In-process backend with simulated latency and scriptable failures.
// Drives the demo binary and the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use log::{debug, info, warn};

use super::fixtures::{self, Fixture};
use super::{BackendError, ChatBackend};
use crate::models::{display_time, Contact, DeliveryStatus, Message, MessageKind, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchContacts,
    FetchMessages,
    SendMessage,
    MarkAsRead,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::FetchContacts => "fetch contacts",
            Operation::FetchMessages => "fetch messages",
            Operation::SendMessage => "send message",
            Operation::MarkAsRead => "mark as read",
        }
    }
}

/// Simulated round-trip time for each operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub fetch_contacts: Duration,
    pub fetch_messages: Duration,
    pub send_message: Duration,
    pub mark_as_read: Duration,
}

impl MockLatency {
    pub fn none() -> Self {
        MockLatency {
            fetch_contacts: Duration::ZERO,
            fetch_messages: Duration::ZERO,
            send_message: Duration::ZERO,
            mark_as_read: Duration::ZERO,
        }
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::FetchContacts => self.fetch_contacts,
            Operation::FetchMessages => self.fetch_messages,
            Operation::SendMessage => self.send_message,
            Operation::MarkAsRead => self.mark_as_read,
        }
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        MockLatency {
            fetch_contacts: Duration::from_millis(500),
            fetch_messages: Duration::from_millis(300),
            send_message: Duration::from_millis(200),
            mark_as_read: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
enum ScriptedFailure {
    Always(String),
    Once(String),
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub contact_id: Option<String>,
}

#[derive(Debug, Default)]
struct MockData {
    fixture: Fixture,
    failures: HashMap<Operation, ScriptedFailure>,
    message_delays: HashMap<String, Duration>, // Contact id -> fetch latency override
    calls: Vec<Call>,
}

pub struct MockBackend {
    data: Mutex<MockData>,
    latency: MockLatency,
    timeout: Option<Duration>,
    failure_rate: f64,
    next_id: AtomicU64,
}

impl MockBackend {
    pub fn new(fixture: Fixture) -> Self {
        MockBackend {
            data: Mutex::new(MockData {
                fixture,
                ..MockData::default()
            }),
            latency: MockLatency::default(),
            timeout: None,
            failure_rate: 0.0,
            next_id: AtomicU64::new(1),
        }
    }

    /// Backend serving the built-in demo conversations
    pub fn seeded() -> Self {
        Self::new(fixtures::seed())
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Give up on any call that takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Probability in `[0, 1]` that any call fails on its own
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Make every following call of `op` fail with `message`
    pub fn fail(&self, op: Operation, message: &str) {
        self.data()
            .failures
            .insert(op, ScriptedFailure::Always(message.to_string()));
    }

    /// Make only the next call of `op` fail with `message`
    pub fn fail_once(&self, op: Operation, message: &str) {
        self.data()
            .failures
            .insert(op, ScriptedFailure::Once(message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.data().failures.clear();
    }

    /// Override the message fetch latency for one contact
    pub fn set_message_latency(&self, contact_id: &str, latency: Duration) {
        self.data()
            .message_delays
            .insert(contact_id.to_string(), latency);
    }

    /// Serve a different contact list from the next fetch on
    pub fn set_contacts(&self, contacts: Vec<Contact>) {
        self.data().fixture.contacts = contacts;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.data().calls.clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.data().calls.iter().filter(|c| c.operation == op).count()
    }

    /// Conversation as the backend currently stores it
    pub fn stored_messages(&self, contact_id: &str) -> Vec<Message> {
        self.data()
            .fixture
            .messages
            .get(contact_id)
            .cloned()
            .unwrap_or_default()
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        // A panic while holding the lock leaves plain data behind, keep serving it
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn call<T, F>(&self, op: Operation, contact_id: Option<&str>, work: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut MockData) -> Result<T, BackendError> + Send,
        T: Send,
    {
        let delay = {
            let mut data = self.data();
            data.calls.push(Call {
                operation: op,
                contact_id: contact_id.map(str::to_string),
            });
            contact_id
                .filter(|_| op == Operation::FetchMessages)
                .and_then(|id| data.message_delays.get(id).copied())
                .unwrap_or_else(|| self.latency.for_operation(op))
        };
        debug!("Mock {} for {:?} takes {:?}", op.label(), contact_id, delay);

        match self.timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, tokio::time::sleep(delay)).await.is_err() {
                    warn!("Mock {} timed out after {:?}", op.label(), limit);
                    return Err(BackendError::TimedOut(op.label().to_string()));
                }
            }
            None => tokio::time::sleep(delay).await,
        }

        let mut data = self.data();
        match data.failures.get(&op).cloned() {
            Some(ScriptedFailure::Always(message)) => {
                return Err(BackendError::Failed(message));
            }
            Some(ScriptedFailure::Once(message)) => {
                data.failures.remove(&op);
                return Err(BackendError::Failed(message));
            }
            None => {}
        }
        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            warn!("Mock {} failed at random", op.label());
            return Err(BackendError::Failed(format!("Simulated {} failure", op.label())));
        }

        work(&mut data)
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn fetch_contacts(&self) -> Result<Vec<Contact>, BackendError> {
        self.call(Operation::FetchContacts, None, |data| {
            Ok(data.fixture.contacts.clone())
        })
        .await
    }

    async fn fetch_messages(&self, contact_id: &str) -> Result<Vec<Message>, BackendError> {
        self.call(Operation::FetchMessages, Some(contact_id), |data| {
            Ok(data
                .fixture
                .messages
                .get(contact_id)
                .cloned()
                .unwrap_or_default())
        })
        .await
    }

    async fn send_message(&self, contact_id: &str, text: &str) -> Result<Message, BackendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BackendError::Failed("Message text is empty".to_string()));
        }
        let id = format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst));

        self.call(Operation::SendMessage, Some(contact_id), |data| {
            let message = Message {
                id,
                text: text.to_string(),
                sender: Sender::Me,
                timestamp: display_time(Local::now()),
                contact_id: contact_id.to_string(),
                status: Some(DeliveryStatus::Sent),
                kind: MessageKind::Text,
            };

            if let Some(contact) = data.fixture.contacts.iter_mut().find(|c| c.id == contact_id) {
                contact.last_message = message.text.clone();
                contact.timestamp = message.timestamp.clone();
            }
            data.fixture
                .messages
                .entry(contact_id.to_string())
                .or_default()
                .push(message.clone());

            info!("Mock stored message {} for contact {}", message.id, contact_id);
            Ok(message)
        })
        .await
    }

    async fn mark_as_read(&self, contact_id: &str) -> Result<(), BackendError> {
        self.call(Operation::MarkAsRead, Some(contact_id), |data| {
            if let Some(contact) = data.fixture.contacts.iter_mut().find(|c| c.id == contact_id) {
                contact.unread = 0;
            }
            Ok(())
        })
        .await
    }
}
