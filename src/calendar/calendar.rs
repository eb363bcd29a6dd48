use chrono::NaiveDateTime;
use color_eyre::Result;

use super::event::{Event, EventDraft, EventId, EventInstance};
use super::expand::{expand, ViewState};
use super::store::Storage;

/// The stored event list. Every successful mutation is written through to storage.
pub struct Calendar<S: Storage> {
    events: Vec<Event>,
    storage: S,
}

impl<S: Storage> Calendar<S> {
    pub fn open(storage: S) -> Self {
        let events = storage.load();
        tracing::info!(count = events.len(), "calendar opened");
        Self { events, storage }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Instances visible in `view`.
    pub fn visible(&self, view: &ViewState) -> Vec<EventInstance> {
        expand(&self.events, view)
    }

    /// Append a new event. An empty title is ignored and yields `None`.
    pub fn create(&mut self, draft: EventDraft) -> Result<Option<EventId>> {
        if draft.title.is_empty() {
            return Ok(None);
        }
        let id = match draft.id {
            Some(id) => id,
            None => EventId::generate(self.events.iter().map(|e| &e.id)),
        };
        self.events.push(draft.into_event(id));
        tracing::info!(%id, "event created");
        self.persist()?;
        Ok(Some(id))
    }

    /// Replace the event with the same id, keeping its position.
    /// Unknown ids and empty titles are ignored.
    pub fn update(&mut self, event: Event) -> Result<bool> {
        if event.title.is_empty() {
            return Ok(false);
        }
        let Some(slot) = self.events.iter_mut().find(|e| e.id == event.id) else {
            tracing::debug!(id = %event.id, "update of unknown event ignored");
            return Ok(false);
        };
        let id = event.id;
        *slot = event;
        tracing::info!(%id, "event updated");
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: EventId) -> Result<bool> {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            tracing::debug!(%id, "delete of unknown event ignored");
            return Ok(false);
        }
        tracing::info!(%id, "event deleted");
        self.persist()?;
        Ok(true)
    }

    /// Re-anchor an event. For a recurring event the whole series moves.
    pub fn move_event(&mut self, id: EventId, new_date: NaiveDateTime) -> Result<bool> {
        let Some(event) = self.get(id) else {
            tracing::debug!(%id, "move of unknown event ignored");
            return Ok(false);
        };
        let moved = Event {
            date: new_date,
            ..event.clone()
        };
        self.update(moved)
    }

    fn persist(&self) -> Result<()> {
        self.storage.save(&self.events).inspect_err(|e| {
            tracing::error!(error = %e, "failed to save events");
        })
    }
}
