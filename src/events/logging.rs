//! Listener that writes every event to the log.

use async_trait::async_trait;
use log::info;

use crate::events::event::TeamEvent;
use crate::events::registry::Listener;
use crate::TeamError;

pub struct LoggingListener;

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &TeamEvent) -> Result<(), TeamError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| TeamError::Internal(format!("event serialization: {e}")))?;

        info!(
            target: "cohort::events",
            "msg=\"event\", name={}, payload={payload}", event.name()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_listener_handles_all_variants() {
        let listener = LoggingListener;
        for event in [
            TeamEvent::user_registered(1, true),
            TeamEvent::team_created(2, 1, false),
            TeamEvent::member_removed(2, 3),
            TeamEvent::invitation_sent(4, 2),
            TeamEvent::invitation_accepted(4, 2, 3),
            TeamEvent::invitation_declined(4),
        ] {
            listener.handle(&event).await.unwrap();
        }
    }
}
