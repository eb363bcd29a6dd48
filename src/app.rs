use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, Months, NaiveDate};

use crate::calendar::{sort_by_date, Calendar, EventId, EventInstance, Storage, ViewState};
use crate::components::event_form::{EventFormState, FormField};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
    Form,
    Move,
}

pub struct App<S: Storage> {
    pub running: bool,
    pub input_mode: InputMode,
    pub today: NaiveDate,
    /// `current_date` doubles as the day cursor.
    pub view: ViewState,
    /// Everything visible for `view`, in expansion order.
    pub instances: Vec<EventInstance>,
    /// The list pane: the cursor day's events, or all results while searching.
    pub listed: Vec<EventInstance>,
    pub event_counts: HashMap<u32, usize>,
    pub list_index: usize,
    pub form_state: Option<EventFormState>,
    pub show_detail: bool,
    pub show_help: bool,
    pub moving: Option<EventId>,
    pub status_message: Option<String>,
    calendar: Calendar<S>,
}

impl<S: Storage> App<S> {
    pub fn new(calendar: Calendar<S>, today: NaiveDate) -> Self {
        let mut app = Self {
            running: true,
            input_mode: InputMode::Normal,
            today,
            view: ViewState::new(today),
            instances: Vec::new(),
            listed: Vec::new(),
            event_counts: HashMap::new(),
            list_index: 0,
            form_state: None,
            show_detail: false,
            show_help: false,
            moving: None,
            status_message: None,
            calendar,
        };
        app.refresh_events();
        app
    }

    pub fn calendar(&self) -> &Calendar<S> {
        &self.calendar
    }

    pub fn cursor(&self) -> NaiveDate {
        self.view.current_date
    }

    /// Today, if the viewed month is the current one.
    pub fn visible_today(&self) -> Option<NaiveDate> {
        let cursor = self.cursor();
        (cursor.year() == self.today.year() && cursor.month() == self.today.month())
            .then_some(self.today)
    }

    pub fn selected(&self) -> Option<&EventInstance> {
        self.listed.get(self.list_index)
    }

    pub fn list_title(&self) -> String {
        if self.view.is_searching() {
            format!("Results for \"{}\"", self.view.search_term)
        } else {
            self.cursor().format("%A, %B %d, %Y").to_string()
        }
    }

    /// Re-run expansion for the current view.
    pub fn refresh_events(&mut self) {
        self.instances = self.calendar.visible(&self.view);

        let cursor = self.cursor();
        self.event_counts.clear();
        for instance in &self.instances {
            let day = instance.day();
            if day.year() == cursor.year() && day.month() == cursor.month() {
                *self.event_counts.entry(day.day()).or_default() += 1;
            }
        }

        self.refresh_list();
    }

    fn refresh_list(&mut self) {
        let cursor = self.cursor();
        self.listed = if self.view.is_searching() {
            self.instances.clone()
        } else {
            self.instances
                .iter()
                .filter(|i| i.day() == cursor)
                .cloned()
                .collect()
        };
        sort_by_date(&mut self.listed);
        self.list_index = self.list_index.min(self.listed.len().saturating_sub(1));
    }

    // ── Cursor and month navigation ──

    pub fn next_day(&mut self) {
        self.set_cursor(self.cursor() + Duration::days(1));
    }

    pub fn prev_day(&mut self) {
        self.set_cursor(self.cursor() - Duration::days(1));
    }

    pub fn next_week(&mut self) {
        self.set_cursor(self.cursor() + Duration::weeks(1));
    }

    pub fn prev_week(&mut self) {
        self.set_cursor(self.cursor() - Duration::weeks(1));
    }

    /// Same day next month, clamped to the month's length.
    pub fn next_month(&mut self) {
        let date = self
            .cursor()
            .checked_add_months(Months::new(1))
            .unwrap_or(self.cursor());
        self.set_cursor(date);
    }

    pub fn prev_month(&mut self) {
        let date = self
            .cursor()
            .checked_sub_months(Months::new(1))
            .unwrap_or(self.cursor());
        self.set_cursor(date);
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.set_cursor(self.today);
    }

    fn set_cursor(&mut self, date: NaiveDate) {
        let old = self.cursor();
        self.view.current_date = date;

        // Only re-expand if the month changed
        if old.month() != date.month() || old.year() != date.year() {
            self.refresh_events();
        } else {
            self.refresh_list();
        }
    }

    pub fn select_next(&mut self) {
        if self.list_index + 1 < self.listed.len() {
            self.list_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.list_index = self.list_index.saturating_sub(1);
    }

    // ── Search ──

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn search_input(&mut self, c: char) {
        self.view.search_term.push(c);
        self.on_search_changed();
    }

    pub fn search_backspace(&mut self) {
        self.view.search_term.pop();
        self.on_search_changed();
    }

    /// Leave search mode, keeping the filter.
    pub fn confirm_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn clear_search(&mut self) {
        self.input_mode = InputMode::Normal;
        if !self.view.search_term.is_empty() {
            self.view.search_term.clear();
            self.on_search_changed();
        }
    }

    fn on_search_changed(&mut self) {
        self.list_index = 0;
        self.refresh_events();
        self.jump_to_first_result();
    }

    /// While searching, bring the first result's month into view.
    fn jump_to_first_result(&mut self) {
        if !self.view.is_searching() {
            return;
        }
        let Some(first) = self.instances.first() else {
            return;
        };
        let day = first.day();
        let cursor = self.cursor();
        if day.month() != cursor.month() || day.year() != cursor.year() {
            if let Some(start) = day.with_day(1) {
                self.set_cursor(start);
            }
        }
    }

    // ── Event form ──

    pub fn open_event_form(&mut self) {
        self.form_state = Some(EventFormState::new(self.cursor()));
        self.input_mode = InputMode::Form;
    }

    pub fn open_edit_form(&mut self) {
        let Some(form) = self.selected().map(EventFormState::edit) else {
            return;
        };
        self.form_state = Some(form);
        self.show_detail = false;
        self.input_mode = InputMode::Form;
    }

    pub fn close_event_form(&mut self) {
        self.form_state = None;
        self.input_mode = InputMode::Normal;
    }

    /// An empty title is ignored and the form stays open.
    pub fn submit_event_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };
        if form.title.is_empty() {
            return;
        }
        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(msg) => {
                self.status_message = Some(msg.to_string());
                return;
            }
        };

        let result = match form.editing {
            Some(id) => self
                .calendar
                .update(draft.into_event(id))
                .map(|changed| changed.then_some("Event updated")),
            None => self
                .calendar
                .create(draft)
                .map(|created| created.map(|_| "Event created")),
        };
        self.report(result);
        self.close_event_form();
        self.after_change();
    }

    pub fn form_tab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.prev();
        }
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(ref mut form) = self.form_state {
            if c == ' ' && form.active_field == FormField::Repeat {
                form.next_recurrence();
            } else {
                form.input_char(c);
            }
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.backspace();
        }
    }

    // ── Delete / move / detail ──

    pub fn delete_selected_event(&mut self) {
        let Some(id) = self.selected().map(|i| i.id) else {
            return;
        };
        let result = self.calendar.delete(id).map(|d| d.then_some("Event deleted"));
        self.report(result);
        self.show_detail = false;
        self.after_change();
    }

    /// Pick up the selected event; the cursor then chooses where it lands.
    pub fn start_move(&mut self) {
        let Some((id, title)) = self.selected().map(|i| (i.id, i.title.clone())) else {
            return;
        };
        self.status_message = Some(format!("Moving \"{}\": pick a day, Enter to drop", title));
        self.moving = Some(id);
        self.show_detail = false;
        self.input_mode = InputMode::Move;
    }

    /// Drop the picked-up event at midnight of the cursor day.
    pub fn drop_move(&mut self) {
        let Some(id) = self.moving.take() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        self.input_mode = InputMode::Normal;
        let Some(target) = self.cursor().and_hms_opt(0, 0, 0) else {
            return;
        };
        let result = self
            .calendar
            .move_event(id, target)
            .map(|moved| moved.then_some("Event moved"));
        self.report(result);
        self.after_change();
    }

    pub fn cancel_move(&mut self) {
        self.moving = None;
        self.input_mode = InputMode::Normal;
        self.status_message = None;
    }

    pub fn open_detail(&mut self) {
        self.show_detail = self.selected().is_some();
    }

    pub fn close_detail(&mut self) {
        self.show_detail = false;
    }

    fn after_change(&mut self) {
        self.refresh_events();
        self.jump_to_first_result();
    }

    fn report(&mut self, result: color_eyre::Result<Option<&'static str>>) {
        match result {
            Ok(Some(msg)) => self.status_message = Some(msg.to_string()),
            Ok(None) => {}
            Err(e) => self.status_message = Some(format!("Save failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::calendar::store::memory::MemoryStore;
    use crate::calendar::{Event, Recurrence};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
    }

    fn make_test_event(id: i64, title: &str, when: NaiveDateTime, recurrence: Recurrence) -> Event {
        Event {
            id: EventId(id),
            title: title.to_string(),
            description: None,
            date: when,
            time: None,
            recurrence,
            color: None,
        }
    }

    fn app_with(events: Vec<Event>, today: NaiveDate) -> App<MemoryStore> {
        App::new(Calendar::open(MemoryStore::with(events)), today)
    }

    fn type_search(app: &mut App<MemoryStore>, term: &str) {
        app.start_search();
        for c in term.chars() {
            app.search_input(c);
        }
    }

    #[test]
    fn test_lists_cursor_day_sorted() {
        let mut late = make_test_event(1, "Late", at(2024, 6, 10), Recurrence::None);
        late.date = date(2024, 6, 10).and_hms_opt(18, 0, 0).unwrap();
        let early = make_test_event(2, "Early", at(2024, 6, 10), Recurrence::None);
        let app = app_with(vec![late, early], date(2024, 6, 10));

        let titles: Vec<_> = app.listed.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Late"]);
        assert_eq!(app.event_counts.get(&10), Some(&2));
    }

    #[test]
    fn test_month_navigation_clamps() {
        let mut app = app_with(vec![], date(2024, 1, 31));
        app.next_month();
        assert_eq!(app.cursor(), date(2024, 2, 29));
        app.prev_month();
        assert_eq!(app.cursor(), date(2024, 1, 29));
    }

    #[test]
    fn test_crossing_month_re_expands() {
        let events = vec![make_test_event(1, "Rent", at(2024, 7, 1), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 30));
        assert!(app.instances.is_empty());

        app.next_day();
        assert_eq!(app.cursor(), date(2024, 7, 1));
        assert_eq!(app.instances.len(), 1);
        assert_eq!(app.listed.len(), 1);
    }

    #[test]
    fn test_today_only_in_its_month() {
        let mut app = app_with(vec![], date(2024, 6, 15));
        assert_eq!(app.visible_today(), Some(date(2024, 6, 15)));
        app.next_month();
        assert_eq!(app.visible_today(), None);
    }

    #[test]
    fn test_search_jumps_to_first_result_month() {
        let events = vec![make_test_event(2, "Dentist", at(2024, 9, 10), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 15));

        type_search(&mut app, "dent");
        assert_eq!(app.cursor(), date(2024, 9, 1));
        assert_eq!(app.listed.len(), 1);
        assert_eq!(app.list_title(), "Results for \"dent\"");
    }

    #[test]
    fn test_search_stays_when_first_result_in_view() {
        let events = vec![make_test_event(2, "Dentist", at(2024, 6, 20), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 15));

        type_search(&mut app, "DENT");
        assert_eq!(app.cursor(), date(2024, 6, 15));
    }

    #[test]
    fn test_clear_search_restores_month_scope() {
        let events = vec![
            make_test_event(1, "Dentist", at(2024, 6, 20), Recurrence::None),
            make_test_event(2, "Dentist again", at(2024, 8, 20), Recurrence::None),
        ];
        let mut app = app_with(events, date(2024, 6, 15));

        type_search(&mut app, "dent");
        assert_eq!(app.instances.len(), 2);

        app.clear_search();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.instances.len(), 1);
    }

    #[test]
    fn test_submit_empty_title_is_ignored() {
        let mut app = app_with(vec![], date(2024, 6, 10));
        app.open_event_form();
        app.submit_event_form();

        assert_eq!(app.input_mode, InputMode::Form);
        assert!(app.form_state.is_some());
        assert!(app.calendar().events().is_empty());
    }

    #[test]
    fn test_submit_creates_event() {
        let mut app = app_with(vec![], date(2024, 6, 10));
        app.open_event_form();
        for c in "Dentist".chars() {
            app.form_input_char(c);
        }
        app.submit_event_form();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.calendar().events().len(), 1);
        assert_eq!(app.calendar().events()[0].date, at(2024, 6, 10));
        assert_eq!(app.listed.len(), 1);
        assert_eq!(app.status_message.as_deref(), Some("Event created"));
    }

    #[test]
    fn test_submit_bad_date_keeps_form() {
        let mut app = app_with(vec![], date(2024, 6, 10));
        app.open_event_form();
        app.form_input_char('X');
        app.form_tab();
        app.form_input_char('x');
        app.submit_event_form();

        assert_eq!(app.input_mode, InputMode::Form);
        assert!(app.calendar().events().is_empty());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_repeat_field_cycles_on_space() {
        let mut app = app_with(vec![], date(2024, 6, 10));
        app.open_event_form();
        for _ in 0..3 {
            app.form_tab();
        }
        app.form_input_char(' ');
        assert_eq!(app.form_state.as_ref().unwrap().recurrence, Recurrence::Daily);
    }

    #[test]
    fn test_edit_recurring_reanchors_at_instance() {
        let events = vec![make_test_event(1, "Standup", at(2024, 6, 3), Recurrence::Daily)];
        let mut app = app_with(events, date(2024, 6, 12));

        app.open_edit_form();
        app.form_input_char('!');
        app.submit_event_form();

        let stored = app.calendar().get(EventId(1)).unwrap();
        assert_eq!(stored.title, "Standup!");
        assert_eq!(stored.date, at(2024, 6, 12));
        assert_eq!(stored.recurrence, Recurrence::Daily);
        assert_eq!(app.calendar().events().len(), 1);
    }

    #[test]
    fn test_delete_selected() {
        let events = vec![make_test_event(1, "Dentist", at(2024, 6, 10), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 10));

        app.delete_selected_event();
        assert!(app.calendar().events().is_empty());
        assert!(app.listed.is_empty());

        // Nothing selected now; a second delete does nothing.
        app.delete_selected_event();
        assert_eq!(app.calendar().storage().saves.get(), 1);
    }

    #[test]
    fn test_move_drops_at_midnight_of_cursor() {
        let mut dentist = make_test_event(1, "Dentist", at(2024, 6, 10), Recurrence::None);
        dentist.date = date(2024, 6, 10).and_hms_opt(15, 30, 0).unwrap();
        let mut app = app_with(vec![dentist], date(2024, 6, 10));

        app.start_move();
        assert_eq!(app.input_mode, InputMode::Move);
        app.next_day();
        app.next_day();
        app.drop_move();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.calendar().get(EventId(1)).unwrap().date, at(2024, 6, 12));
        assert_eq!(app.listed.len(), 1);
    }

    #[test]
    fn test_cancel_move_leaves_event() {
        let events = vec![make_test_event(1, "Dentist", at(2024, 6, 10), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 10));

        app.start_move();
        app.next_week();
        app.cancel_move();

        assert!(app.moving.is_none());
        assert_eq!(app.calendar().get(EventId(1)).unwrap().date, at(2024, 6, 10));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let events = vec![make_test_event(1, "Dentist", at(2024, 6, 10), Recurrence::None)];
        let mut app = app_with(events, date(2024, 6, 10));
        app.calendar().storage().fail.set(true);

        app.delete_selected_event();
        assert!(app
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Save failed")));
    }

    #[test]
    fn test_selection_bounds() {
        let events = vec![
            make_test_event(1, "A", at(2024, 6, 10), Recurrence::None),
            make_test_event(2, "B", at(2024, 6, 10), Recurrence::None),
        ];
        let mut app = app_with(events, date(2024, 6, 10));

        app.select_prev();
        assert_eq!(app.list_index, 0);
        app.select_next();
        app.select_next();
        assert_eq!(app.list_index, 1);
        app.next_day();
        assert_eq!(app.list_index, 0);
        assert!(app.selected().is_none());
    }
}
