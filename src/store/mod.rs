//! Reducer-style state container for one working session.
//!
//! - `Model`: brief, content graph, progress log, operation status
//! - `Message`: inputs from the orchestrator and the caller
//! - `Event`: outputs, broadcast to subscribers
//! - `update`: pure function that transforms state
//!
//! [`Store`] wraps the model behind a lock and fans events out over a
//! broadcast channel. The lock is never held across an await point.

pub mod event;
pub mod message;
pub mod model;
pub mod update;

use std::sync::{Arc, RwLock, RwLockReadGuard};

use tokio::sync::broadcast;

pub use event::{Event, NodeField, Outcome};
pub use message::Message;
pub use model::{Activity, Model};
pub use update::update;

use crate::llog_trace;

const EVENT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Store {
    model: Arc<RwLock<Model>>,
    events: broadcast::Sender<Event>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_model(Model::default())
    }

    pub fn with_model(model: Model) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            model: Arc::new(RwLock::new(model)),
            events,
        }
    }

    /// Apply a message and broadcast the resulting events.
    pub fn dispatch(&self, msg: Message) -> Vec<Event> {
        let events = {
            let mut model = self.model.write().unwrap_or_else(|e| e.into_inner());
            update(&mut model, msg)
        };
        for event in &events {
            llog_trace!("store: event {:?}", event);
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
        events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Read access to the model. Do not hold across an await.
    pub fn read(&self) -> RwLockReadGuard<'_, Model> {
        self.model.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Model {
        self.read().clone()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let model = self.read();
        f.debug_struct("Store")
            .field("nodes", &model.graph.len())
            .field("activity", &model.activity)
            .finish()
    }
}
