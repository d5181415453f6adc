// Chat synchronization core
// The controller owns the store, runs backend calls as tokio tasks and applies
// their results when the owner drains the outcome channel. State is never
// touched from inside a task.
//
// Split by concern:
//   contacts.rs - contact list, selection and read receipts
//   messages.rs - message history and optimistic sends

use std::future::Future;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::backend::ChatBackend;

pub mod contacts;
pub mod error;
pub mod events;
pub mod messages;
pub mod store;
pub mod view;

pub use error::ChatError;
pub use events::ChatEvent;
pub use store::{ChatStore, SessionState};
pub use view::{last_message_for, summarize, ChatSnapshot, ContactRow, Summary, NO_MESSAGES_YET};

const OUTCOME_CHANNEL_SIZE: usize = 100;

// A finished backend call. Read receipt failures carry no event.
#[derive(Debug)]
struct Outcome {
    operation: &'static str,
    event: Option<ChatEvent>,
}

pub struct ChatController<B: ChatBackend + 'static> {
    store: ChatStore,
    backend: Arc<B>,
    outcome_tx: mpsc::Sender<Outcome>,
    outcome_rx: mpsc::Receiver<Outcome>,
    outstanding: usize,
    started: bool,
}

impl<B: ChatBackend + 'static> ChatController<B> {
    /// Create a controller for one session.
    ///
    /// Operations spawn tokio tasks, so the controller must be driven from
    /// inside a tokio runtime.
    pub fn new(backend: Arc<B>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_SIZE);
        ChatController {
            store: ChatStore::new(),
            backend,
            outcome_tx,
            outcome_rx,
            outstanding: 0,
            started: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    /// Derived view for presentation
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot::from_state(self.store.state())
    }

    /// Number of backend operations whose result has not been applied yet
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Wait for the next completed operation that changes state and return the
    /// event that was applied. Returns `None` once nothing is in flight.
    pub async fn next_event(&mut self) -> Option<ChatEvent> {
        while self.outstanding > 0 {
            let outcome = self.outcome_rx.recv().await?;
            if let Some(event) = self.complete(outcome) {
                return Some(event);
            }
        }
        None
    }

    /// Apply every result that is already waiting, without blocking.
    /// Returns how many operations completed.
    pub fn poll_events(&mut self) -> usize {
        let mut completed = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.complete(outcome);
            completed += 1;
        }
        completed
    }

    /// Drive the session until every operation, including follow-ups they
    /// trigger, has been applied.
    pub async fn settle(&mut self) {
        while self.outstanding > 0 {
            match self.outcome_rx.recv().await {
                Some(outcome) => {
                    self.complete(outcome);
                }
                None => {
                    error!("Outcome channel closed with {} operations outstanding", self.outstanding);
                    self.outstanding = 0;
                }
            }
        }
    }

    /// Apply an event that cannot be rejected
    pub(crate) fn record(&mut self, event: ChatEvent) {
        let name = event.name();
        if let Err(e) = self.store.apply(event) {
            error!("Store rejected {}: {}", name, e);
        }
    }

    /// Run `task` in the background and post its result back to this controller
    pub(crate) fn spawn<F>(&mut self, operation: &'static str, task: F)
    where
        F: Future<Output = Option<ChatEvent>> + Send + 'static,
    {
        self.outstanding += 1;
        debug!("Started {} ({} in flight)", operation, self.outstanding);

        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let event = task.await;
            if let Err(e) = outcome_tx.send(Outcome { operation, event }).await {
                error!("Session ended before {} finished: {}", operation, e);
            }
        });
    }

    fn complete(&mut self, outcome: Outcome) -> Option<ChatEvent> {
        self.outstanding = self.outstanding.saturating_sub(1);

        let Some(event) = outcome.event else {
            debug!("{} finished without a state change", outcome.operation);
            return None;
        };
        debug!("{} finished with {}", outcome.operation, event.name());

        let previous = self.store.state().selected().map(str::to_string);
        let applied = event.clone();
        if let Err(e) = self.store.apply(event) {
            warn!("Discarding result of {}: {}", outcome.operation, e);
            return None;
        }

        // A fresh contact list may pick the first contact; open it like a user selection would
        let current = self.store.state().selected().map(str::to_string);
        if current != previous {
            if let Some(contact_id) = current {
                info!("Contact {} selected automatically", contact_id);
                self.open_thread(&contact_id);
            }
        }

        Some(applied)
    }
}
