pub mod calendar;
pub mod event;
pub mod expand;
pub mod store;

pub use calendar::Calendar;
pub use event::{Event, EventDraft, EventId, EventInstance, Recurrence};
pub use expand::{sort_by_date, ViewState};
pub use store::{JsonStore, Storage};
