use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::tools::NewEvent;

/// Operations the calendar service offers.
///
/// Each method is one remote call in a real integration. Results are already
/// human-readable because they go straight back into the model's prompt.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn list_calendars(&self) -> Result<String>;

    async fn list_events(&self, calendar_id: &str) -> Result<String>;

    async fn create_event(&self, event: &NewEvent) -> Result<String>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        changes: &[(String, String)],
    ) -> Result<String>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<String>;
}

/// Canned calendar used until the service protocol is wired up
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCalendar;

#[async_trait]
impl CalendarBackend for StubCalendar {
    async fn list_calendars(&self) -> Result<String> {
        Ok("Primary Calendar (primary)\n\
            Work Calendar (work@example.com)\n\
            Family Calendar (family@example.com)"
            .to_string())
    }

    async fn list_events(&self, calendar_id: &str) -> Result<String> {
        Ok(format!(
            "Events for {}:\n\
             1. Team Meeting (9:00 AM - 10:00 AM)\n\
             2. Lunch with Sarah (12:00 PM - 1:00 PM)\n\
             3. Project Review (3:00 PM - 4:00 PM)",
            calendar_id
        ))
    }

    async fn create_event(&self, event: &NewEvent) -> Result<String> {
        debug!("stub create-event on {}", event.calendar_id);
        Ok(format!(
            "Created event: {} from {} to {}",
            event.summary, event.start, event.end
        ))
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        changes: &[(String, String)],
    ) -> Result<String> {
        debug!("stub update-event on {}", calendar_id);
        let changes = changes
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("Updated event {} with changes: {}", event_id, changes))
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<String> {
        debug!("stub delete-event on {}", calendar_id);
        Ok(format!("Deleted event: {}", event_id))
    }
}
