use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::theme::{self, Theme};

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub struct MonthView;

impl MonthView {
    /// `today` is only passed when the viewed month is the current one.
    /// `moving` outlines the cursor as a drop target.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        cursor: NaiveDate,
        today: Option<NaiveDate>,
        event_counts: &HashMap<u32, usize>,
        moving: bool,
    ) {
        let year = cursor.year();
        let month = cursor.month();

        let title = format!(" {} {} ", month_name(month), year);

        let block = Block::default()
            .title(title)
            .title_style(theme::current().header)
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Header row
        let header_cells: Vec<Span> = DAY_NAMES
            .iter()
            .map(|d| Span::styled(format!("{:^5}", d), theme::current().header))
            .collect();
        let header = Line::from(header_cells);

        let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return;
        };
        let first_weekday = first_day.weekday().num_days_from_sunday() as i32;
        let days_in_month = days_in_month(year, month) as i32;

        let mut weeks: Vec<Line> = Vec::new();
        let mut current_day: i32 = 1 - first_weekday;

        while current_day <= days_in_month {
            let mut cells: Vec<Span> = Vec::new();
            for _ in 0..7 {
                if current_day < 1 || current_day > days_in_month {
                    cells.push(Span::raw("     "));
                } else {
                    let day = current_day as u32;
                    let marker = event_marker(event_counts.get(&day).copied().unwrap_or(0));
                    let day_str = format!("{:>2}{} ", day, marker);

                    let is_cursor = day == cursor.day();
                    let is_today = today.is_some_and(|t| t.day() == day);

                    let style = day_style(theme::current(), is_cursor, is_today, moving);

                    cells.push(Span::styled(format!(" {}", day_str), style));
                }
                current_day += 1;
            }
            weeks.push(Line::from(cells));
        }

        // Layout: header + weeks
        let mut constraints = vec![Constraint::Length(1)]; // header
        for _ in &weeks {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(0)); // fill remaining

        let rows = Layout::vertical(constraints).split(inner);

        frame.render_widget(Paragraph::new(header), rows[0]);
        for (i, week) in weeks.into_iter().enumerate() {
            frame.render_widget(Paragraph::new(week), rows[i + 1]);
        }
    }
}

fn day_style(theme: &Theme, is_cursor: bool, is_today: bool, moving: bool) -> Style {
    if is_cursor && moving {
        // Drop target
        theme.highlight.add_modifier(Modifier::UNDERLINED)
    } else if is_cursor && is_today {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if is_cursor {
        theme.selected
    } else if is_today {
        theme.today
    } else {
        Style::default()
    }
}

/// One character summarising how many events fall on a day.
fn event_marker(count: usize) -> char {
    match count {
        0 => ' ',
        1 => '*',
        2..=9 => char::from_digit(count as u32, 10).unwrap_or('+'),
        _ => '+',
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 31,
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
