//! Process-wide event listener registry.
//!
//! Listeners are installed once at startup; a second installation is
//! refused. Dispatch never fails the caller: listener errors are logged
//! and swallowed.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use log::warn;

use crate::events::event::TeamEvent;
use crate::TeamError;

#[async_trait]
pub trait Listener: Send + Sync {
    async fn handle(&self, event: &TeamEvent) -> Result<(), TeamError>;
}

static LISTENERS: OnceLock<Vec<Arc<dyn Listener>>> = OnceLock::new();

/// Installs the listener set for the lifetime of the process. Returns
/// false if listeners were already installed.
pub fn register_event_listeners(listeners: Vec<Arc<dyn Listener>>) -> bool {
    LISTENERS.set(listeners).is_ok()
}

/// Delivers an event to every installed listener.
pub async fn dispatch(event: &TeamEvent) {
    let Some(listeners) = LISTENERS.get() else {
        return;
    };

    for listener in listeners {
        if let Err(e) = listener.handle(event).await {
            warn!(
                target: "cohort",
                "msg=\"event listener failed\", event={}, error=\"{e}\"", event.name()
            );
        }
    }
}
