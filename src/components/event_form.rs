use chrono::{NaiveDate, NaiveTime};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::calendar::event::DEFAULT_COLOR;
use crate::calendar::{EventDraft, EventId, EventInstance, Recurrence};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    Time,
    Repeat,
    Description,
    Color,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::Time,
            FormField::Time => FormField::Repeat,
            FormField::Repeat => FormField::Description,
            FormField::Description => FormField::Color,
            FormField::Color => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Color,
            FormField::Date => FormField::Title,
            FormField::Time => FormField::Date,
            FormField::Repeat => FormField::Time,
            FormField::Description => FormField::Repeat,
            FormField::Color => FormField::Description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventFormState {
    /// Set when editing an existing event.
    pub editing: Option<EventId>,
    pub title: String,
    pub date: String,
    pub time: String,
    pub recurrence: Recurrence,
    pub description: String,
    pub color: String,
    pub active_field: FormField,
    /// Time of day kept from the edited occurrence; new events start at midnight.
    anchor_time: NaiveTime,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            editing: None,
            title: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            time: String::new(),
            recurrence: Recurrence::None,
            description: String::new(),
            color: DEFAULT_COLOR.to_string(),
            active_field: FormField::Title,
            anchor_time: NaiveTime::MIN,
        }
    }

    /// Prefill from an occurrence. Saving re-anchors the event at that occurrence's date.
    pub fn edit(instance: &EventInstance) -> Self {
        Self {
            editing: Some(instance.id),
            title: instance.title.clone(),
            date: instance.date.format("%Y-%m-%d").to_string(),
            time: instance.time.clone().unwrap_or_default(),
            recurrence: instance.recurrence,
            description: instance.description.clone().unwrap_or_default(),
            color: instance
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            active_field: FormField::Title,
            anchor_time: instance.date.time(),
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn time_is_valid(&self) -> bool {
        let time = self.time.trim();
        time.is_empty() || NaiveTime::parse_from_str(time, "%H:%M").is_ok()
    }

    /// Build the event this form describes, or say which field is wrong.
    pub fn to_draft(&self) -> Result<EventDraft, &'static str> {
        let date = self.parsed_date().ok_or("Invalid date, expected YYYY-MM-DD")?;
        if !self.time_is_valid() {
            return Err("Invalid time, expected HH:MM");
        }

        let mut draft = EventDraft::new(self.title.clone(), date.and_time(self.anchor_time));
        draft.id = self.editing;
        draft.time = non_empty(&self.time);
        draft.recurrence = self.recurrence;
        draft.description = non_empty(&self.description);
        draft.color = non_empty(&self.color);
        Ok(draft)
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Date => self.date.push(c),
            FormField::Time => self.time.push(c),
            FormField::Description => self.description.push(c),
            FormField::Color => self.color.push(c),
            FormField::Repeat => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => { self.title.pop(); }
            FormField::Date => { self.date.pop(); }
            FormField::Time => { self.time.pop(); }
            FormField::Description => { self.description.pop(); }
            FormField::Color => { self.color.pop(); }
            FormField::Repeat => {}
        }
    }

    pub fn next_recurrence(&mut self) {
        self.recurrence = self.recurrence.next();
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState) {
        // Center the form popup
        let form_w = area.width.min(56).max(30);
        let form_h = area.height.min(12).max(10);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        // Clear background
        frame.render_widget(Clear, form_area);

        let heading = match state.editing {
            Some(_) => " Edit Event ".to_string(),
            None => match state.parsed_date() {
                Some(d) => format!(" Add Event for {} ", d.format("%a %b %d %Y")),
                None => " Add Event ".to_string(),
            },
        };

        let block = Block::default()
            .title(heading)
            .title_style(Style::default().fg(ratatui::style::Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Green));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // time
            Constraint::Length(1), // repeat
            Constraint::Length(1), // description
            Constraint::Length(1), // color
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let active = state.active_field;
        render_field(frame, rows[0], "Title:", &state.title, active == FormField::Title);
        render_field(frame, rows[1], "Date:", &state.date, active == FormField::Date);
        render_field(frame, rows[2], "Time:", &state.time, active == FormField::Time);
        render_field(
            frame,
            rows[3],
            "Repeat:",
            &format!("< {} >", state.recurrence.label()),
            active == FormField::Repeat,
        );
        render_field(frame, rows[4], "Notes:", &state.description, active == FormField::Description);

        let swatch = Span::styled("  ", Style::default().bg(theme::event_color(Some(&state.color))));
        let mut color_line = field_spans("Color:", &state.color, active == FormField::Color);
        color_line.push(Span::raw(" "));
        color_line.push(swatch);
        frame.render_widget(Paragraph::new(Line::from(color_line)), rows[5]);

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::current().dim),
            Span::styled("Space", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Repeat ", theme::current().dim),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::current().dim),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::current().dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[7]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    frame.render_widget(Paragraph::new(Line::from(field_spans(label, value, active))), area);
}

fn field_spans(label: &str, value: &str, active: bool) -> Vec<Span<'static>> {
    let cursor = if active { "_" } else { "" };

    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    vec![
        Span::styled(format!("{:<8}", label), theme::current().dim),
        Span::styled(format!("{}{}", value, cursor), style),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn make_test_instance() -> EventInstance {
        EventInstance {
            id: EventId(7),
            title: "Standup".to_string(),
            description: None,
            date: june(12).and_hms_opt(9, 15, 0).unwrap(),
            time: Some("09:15".to_string()),
            recurrence: Recurrence::Daily,
            color: Some("#22c55e".to_string()),
        }
    }

    #[test]
    fn test_new_form_defaults() {
        let form = EventFormState::new(june(10));
        assert_eq!(form.date, "2024-06-10");
        assert_eq!(form.color, DEFAULT_COLOR);
        assert_eq!(form.recurrence, Recurrence::None);
        assert_eq!(form.active_field, FormField::Title);
    }

    #[test]
    fn test_new_event_anchored_at_midnight() {
        let mut form = EventFormState::new(june(10));
        form.title = "Dentist".to_string();
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.date, june(10).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(draft.id, None);
        assert_eq!(draft.time, None);
        assert_eq!(draft.description, None);
    }

    #[test]
    fn test_edit_keeps_time_and_reanchors() {
        let mut form = EventFormState::edit(&make_test_instance());
        assert_eq!(form.editing, Some(EventId(7)));
        assert_eq!(form.date, "2024-06-12");

        form.date = "2024-06-20".to_string();
        let draft = form.to_draft().unwrap();
        let expected: NaiveDateTime = june(20).and_hms_opt(9, 15, 0).unwrap();
        assert_eq!(draft.date, expected);
        assert_eq!(draft.id, Some(EventId(7)));
        assert_eq!(draft.recurrence, Recurrence::Daily);
        assert_eq!(draft.time.as_deref(), Some("09:15"));
    }

    #[test]
    fn test_invalid_date_and_time() {
        let mut form = EventFormState::new(june(10));
        form.title = "Dentist".to_string();
        form.date = "2024-13-01".to_string();
        assert!(form.to_draft().is_err());

        form.date = "2024-06-10".to_string();
        form.time = "25:00".to_string();
        assert!(form.to_draft().is_err());

        form.time = "14:30".to_string();
        assert!(form.to_draft().is_ok());
    }

    #[test]
    fn test_typing_goes_to_active_field() {
        let mut form = EventFormState::new(june(10));
        form.input_char('H');
        form.input_char('i');
        form.active_field = form.active_field.next().next();
        form.input_char('9');
        form.backspace();
        form.input_char('8');

        assert_eq!(form.title, "Hi");
        assert_eq!(form.time, "8");
    }

    #[test]
    fn test_repeat_field_ignores_text() {
        let mut form = EventFormState::new(june(10));
        form.active_field = FormField::Repeat;
        form.input_char('x');
        form.next_recurrence();
        assert_eq!(form.recurrence, Recurrence::Daily);
        assert!(form.title.is_empty());
    }

    #[test]
    fn test_field_cycle() {
        let mut field = FormField::Title;
        for _ in 0..6 {
            field = field.next();
        }
        assert_eq!(field, FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Color);
    }
}
