//! Server events and the observer registry

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::application::errors::PluginResult;

/// Kind of notification received from the chat server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    ClientEntered,
    ClientLeft,
    ClientMoved,
    TextMessage,
    ChannelEdited,
    ServerEdited,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::ClientEntered => "client-entered",
            EventType::ClientLeft => "client-left",
            EventType::ClientMoved => "client-moved",
            EventType::TextMessage => "text-message",
            EventType::ChannelEdited => "channel-edited",
            EventType::ServerEdited => "server-edited",
            EventType::Other(s) => s,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "client-entered" => EventType::ClientEntered,
            "client-left" => EventType::ClientLeft,
            "client-moved" => EventType::ClientMoved,
            "text-message" => EventType::TextMessage,
            "channel-edited" => EventType::ChannelEdited,
            "server-edited" => EventType::ServerEdited,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single server notification with its key/value payload
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub data: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            data: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Event observer function type
pub type Observer = Arc<dyn Fn(&Event) -> PluginResult<()> + Send + Sync>;

/// Maps each event type to its observers, in registration order.
///
/// Observers are only ever appended. Registering the same observer twice
/// means it is called twice.
#[derive(Default)]
pub struct EventRegistry {
    observers: HashMap<EventType, Vec<Observer>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, event_type: EventType, observer: Observer) {
        self.observers.entry(event_type).or_default().push(observer);
    }

    pub fn observers_for(&self, event_type: &EventType) -> &[Observer] {
        self.observers
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Call every observer registered for the event's type.
    ///
    /// A failing observer is logged and skipped; the remaining observers still
    /// run. Returns the number of observers called.
    pub fn dispatch(&self, event: &Event) -> usize {
        let observers = self.observers_for(&event.event_type);
        for (index, observer) in observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("Observer #{} for {} failed: {}", index, event.event_type, e);
                }
                Err(_) => {
                    tracing::error!("Observer #{} for {} panicked", index, event.event_type);
                }
            }
        }
        observers.len()
    }

    /// Number of observers across all event types
    pub fn len(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
