use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::calendar::EventInstance;
use crate::theme;

/// The event list beside the month grid: one day's events, or every search result.
pub struct DayView;

impl DayView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        title: &str,
        events: &[EventInstance],
        selected: usize,
        show_dates: bool,
    ) {
        let count_str = match events.len() {
            0 => String::new(),
            1 => " 1 event ".to_string(),
            n => format!(" {} events ", n),
        };

        let block = Block::default()
            .title(format!(" {} ", title))
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(count_str, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No events").style(theme::current().dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let inner_h = area.height.saturating_sub(2) as usize;

        // Keep the selection on screen
        let scroll = (selected + 1).saturating_sub(inner_h.max(1));

        let items: Vec<ListItem> = events
            .iter()
            .enumerate()
            .skip(scroll)
            .map(|(i, ev)| format_event(ev, inner_w, show_dates, i == selected))
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}

fn format_event(
    ev: &EventInstance,
    max_width: usize,
    show_date: bool,
    selected: bool,
) -> ListItem<'static> {
    let swatch = Span::styled("  ", Style::default().bg(theme::event_color(ev.color.as_deref())));

    let when = if show_date {
        format!(" {} ", ev.date.format("%b %d %Y"))
    } else {
        format!(" {:<7} ", ev.time_display())
    };
    let when_span = Span::styled(when.clone(), Style::default().add_modifier(Modifier::DIM));

    let title_style = if selected {
        theme::current().selected
    } else {
        Style::default()
    };
    let title_span = Span::styled(ev.title.clone(), title_style);

    let mut spans = vec![swatch, when_span, title_span];

    // Only show the repeat rule if there's room
    let used = 2 + when.len() + ev.title.len();
    let repeat = ev.recurrence.as_str();
    if ev.recurrence != crate::calendar::Recurrence::None && used + 3 + repeat.len() <= max_width {
        spans.push(Span::styled(format!(" ({})", repeat), theme::current().dim));
    }

    ListItem::new(Line::from(spans))
}

/// Render an event detail popup overlay.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, ev: &EventInstance) {
    let popup_w = area.width.min(60).max(30);
    let popup_h = area.height.min(16).max(8);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" {} ", ev.title))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("Date: ", theme::current().dim),
        Span::styled(ev.date.format("%A, %B %d, %Y").to_string(), Style::default()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Time: ", theme::current().dim),
        Span::styled(ev.time_display(), Style::default()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Repeat: ", theme::current().dim),
        Span::styled(ev.recurrence.label(), Style::default()),
    ]));
    if let Some(ref color) = ev.color {
        lines.push(Line::from(vec![
            Span::styled("Color: ", theme::current().dim),
            Span::styled("  ", Style::default().bg(theme::event_color(Some(color)))),
            Span::styled(format!(" {}", color), Style::default()),
        ]));
    }

    if let Some(ref description) = ev.description {
        lines.push(Line::from(""));
        for line in description.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    // Footer hint
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "e:Edit  m:Move  d:Delete  Esc:Close",
        theme::current().dim,
    )));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
