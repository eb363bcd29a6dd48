//! Recurring-event expansion.
//!
//! Turns stored base events into the concrete instances visible for a view:
//! a month when no search is active, or every match within a wider window
//! around each anchor when one is.

use std::ops::RangeInclusive;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use super::event::{Event, EventInstance, Recurrence};

/// The pair of inputs that decides what is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Its month and year define the window when no search is active.
    pub current_date: NaiveDate,
    /// Empty means no search.
    pub search_term: String,
}

impl ViewState {
    pub fn new(current_date: NaiveDate) -> Self {
        Self {
            current_date,
            search_term: String::new(),
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.search_term.is_empty()
    }

    /// Searching shows every occurrence; otherwise only those in the current month.
    pub fn includes(&self, date: NaiveDateTime) -> bool {
        self.is_searching()
            || (date.month() == self.current_date.month() && date.year() == self.current_date.year())
    }
}

impl Recurrence {
    /// Inclusive step offsets around the anchor, or `None` for a one-off.
    pub fn window(&self, searching: bool) -> Option<RangeInclusive<i32>> {
        match (self, searching) {
            (Recurrence::None, _) => None,
            (Recurrence::Daily, false) => Some(-15..=45),
            (Recurrence::Daily, true) => Some(-30..=60),
            (Recurrence::Weekly, false) => Some(-3..=7),
            (Recurrence::Weekly, true) => Some(-6..=12),
            (Recurrence::Monthly, false) => Some(-2..=2),
            (Recurrence::Monthly, true) => Some(-4..=4),
        }
    }

    /// The anchor moved by `steps` units of this recurrence, or `None` past
    /// the representable date range.
    pub fn step(&self, anchor: NaiveDateTime, steps: i32) -> Option<NaiveDateTime> {
        match self {
            Recurrence::None => Some(anchor),
            Recurrence::Daily => anchor.checked_add_signed(Duration::days(steps as i64)),
            Recurrence::Weekly => anchor.checked_add_signed(Duration::weeks(steps as i64)),
            Recurrence::Monthly => Some(add_months(anchor, steps)),
        }
    }
}

/// Expand `events` into the instances visible in `view`.
///
/// Output follows the order of `events`, then ascending step within each
/// series. It is not sorted by date; see [`sort_by_date`].
pub fn expand(events: &[Event], view: &ViewState) -> Vec<EventInstance> {
    let searching = view.is_searching();
    let mut result = Vec::new();

    for event in events.iter().filter(|e| e.matches(&view.search_term)) {
        match event.recurrence.window(searching) {
            Some(window) => {
                for i in window {
                    let Some(date) = event.recurrence.step(event.date, i) else {
                        continue;
                    };
                    if view.includes(date) {
                        result.push(event.instance_at(date));
                    }
                }
            }
            None => {
                if view.includes(event.date) {
                    result.push(event.instance_at(event.date));
                }
            }
        }
    }

    tracing::debug!(
        search = %view.search_term,
        events = events.len(),
        instances = result.len(),
        "expanded events"
    );
    result
}

/// Stable sort by occurrence date, for renderers that need calendar order.
pub fn sort_by_date(instances: &mut [EventInstance]) {
    instances.sort_by_key(|i| i.date);
}

/// Add calendar months, keeping the day number and time of day.
///
/// A day past the end of the target month overflows into the following
/// month: Jan 31 + 1 month is Mar 2 in a leap year and Mar 3 otherwise.
pub fn add_months(date: NaiveDateTime, months: i32) -> NaiveDateTime {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_signed(Duration::days(date.day0() as i64)))
        .map(|day| day.and_time(date.time()))
        // Outside chrono's representable range; leave the date where it was.
        .unwrap_or(date)
}
