//! Host handle passed to every plugin setup routine

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::application::errors::BotError;
use crate::domain::traits::{BotInfo, Connection};

/// What a plugin may ask the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Run the shutdown hooks and exit
    Stop,
    /// Run the shutdown hooks, reload the configuration and load plugins again
    Restart,
}

/// Cheap-to-clone handle to the running bot
#[derive(Clone)]
pub struct BotHandle {
    connection: Arc<dyn Connection>,
    control: Arc<Mutex<Option<ControlRequest>>>,
}

impl BotHandle {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            control: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn info(&self) -> BotInfo {
        self.connection.info()
    }

    pub fn send_text(&self, client_id: &str, text: &str) -> Result<(), BotError> {
        self.connection.send_text(client_id, text)
    }

    /// Ask the host to stop or restart. A pending `Stop` is never downgraded.
    pub fn request(&self, request: ControlRequest) {
        let mut slot = match self.control.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *slot != Some(ControlRequest::Stop) {
            *slot = Some(request);
        }
    }

    /// Take the pending request, leaving none behind
    pub fn take_request(&self) -> Option<ControlRequest> {
        match self.control.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotHandle")
            .field("bot", &self.connection.info().name)
            .finish_non_exhaustive()
    }
}
