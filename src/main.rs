mod app;
mod calendar;
mod components;
mod config;
mod logging;
mod theme;
mod tui;

use std::time::Duration;

use app::{App, InputMode};
use calendar::{Calendar, JsonStore, Storage};
use chrono::Local;
use color_eyre::Result;
use config::Config;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};

fn main() -> Result<()> {
    color_eyre::install()?;

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    logging::init(&config)?;
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "ignoring malformed config");
    }

    let store = JsonStore::new(config.data_path());
    tracing::info!(
        data_file = %store.path().display(),
        theme = %theme::current().name,
        "event calendar starting"
    );

    let mut app = App::new(Calendar::open(store), Local::now().date_naive());

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;

    tracing::info!(events = app.calendar().events().len(), "event calendar stopped");
    result
}

fn run<S: Storage>(terminal: &mut tui::Tui, app: &mut App<S>) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: content + status bar
            let layout = Layout::vertical([
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

            render_main(frame, layout[0], app);

            if let Some(ref form) = app.form_state {
                components::EventForm::render(frame, area, form);
            }

            if app.show_detail {
                if let Some(selected) = app.selected() {
                    components::day_view::render_detail_popup(frame, area, selected);
                }
            }

            if app.show_help {
                render_help(frame, area);
            }

            components::StatusBar::render(
                frame,
                layout[1],
                app.input_mode,
                &app.view.search_term,
                app.status_message.as_deref(),
            );
        })?;

        if let Some(key) = tui::next_key_event(Duration::from_millis(100))? {
            // Clear status message on any key, except while a move is in progress
            if app.input_mode != InputMode::Move {
                app.status_message = None;
            }

            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            // Detail popup takes priority
            if app.show_detail {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => app.close_detail(),
                    KeyCode::Char('e') => app.open_edit_form(),
                    KeyCode::Char('m') => app.start_move(),
                    KeyCode::Char('d') => app.delete_selected_event(),
                    _ => {}
                }
                continue;
            }

            match app.input_mode {
                InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
                InputMode::Search => handle_search_input(app, key.code),
                InputMode::Form => handle_form_input(app, key.code),
                InputMode::Move => handle_move_input(app, key.code),
            }
        }
    }

    Ok(())
}

fn handle_normal_input<S: Storage>(app: &mut App<S>, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('/'), _) => app.start_search(),
        (KeyCode::Esc, _) => app.clear_search(),
        (KeyCode::Char('n'), _) => app.open_event_form(),
        (KeyCode::Char('e'), _) => app.open_edit_form(),
        (KeyCode::Char('d'), _) => app.delete_selected_event(),
        (KeyCode::Char('m'), _) => app.start_move(),
        (KeyCode::Enter, _) => app.open_detail(),
        (KeyCode::Char('j'), _) => app.select_next(),
        (KeyCode::Char('k'), _) => app.select_prev(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => navigate(app, code),
    }
}

/// Cursor movement shared by normal and move mode.
fn navigate<S: Storage>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Left | KeyCode::Char('h') => app.prev_day(),
        KeyCode::Right | KeyCode::Char('l') => app.next_day(),
        KeyCode::Up => app.prev_week(),
        KeyCode::Down => app.next_week(),
        KeyCode::Char('[') => app.prev_month(),
        KeyCode::Char(']') => app.next_month(),
        _ => {}
    }
}

fn handle_search_input<S: Storage>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_input(c),
        _ => {}
    }
}

fn handle_form_input<S: Storage>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_event_form(),
        KeyCode::Enter => app.submit_event_form(),
        KeyCode::Tab => app.form_tab(),
        KeyCode::BackTab => app.form_backtab(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(c) => app.form_input_char(c),
        _ => {}
    }
}

fn handle_move_input<S: Storage>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_move(),
        KeyCode::Enter => app.drop_move(),
        KeyCode::Char('k') => app.prev_week(),
        KeyCode::Char('j') => app.next_week(),
        _ => navigate(app, code),
    }
}

fn render_main<S: Storage>(frame: &mut ratatui::Frame, area: Rect, app: &App<S>) {
    let total_width = area.width;
    let moving = app.input_mode == InputMode::Move;

    if total_width < 60 {
        let content = Layout::vertical([Constraint::Length(9), Constraint::Min(3)]).split(area);
        components::MonthView::render(
            frame, content[0], app.cursor(), app.visible_today(), &app.event_counts, moving,
        );
        render_list(frame, content[1], app);
    } else {
        let month_w = if total_width >= 100 { 44 } else { 37 };
        let content = Layout::horizontal([
            Constraint::Length(month_w),
            Constraint::Min(20),
        ])
        .split(area);

        components::MonthView::render(
            frame, content[0], app.cursor(), app.visible_today(), &app.event_counts, moving,
        );
        render_list(frame, content[1], app);
    }
}

fn render_list<S: Storage>(frame: &mut ratatui::Frame, area: Rect, app: &App<S>) {
    components::DayView::render(
        frame,
        area,
        &app.list_title(),
        &app.listed,
        app.list_index,
        app.view.is_searching(),
    );
}

fn render_help(frame: &mut ratatui::Frame, area: Rect) {
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.min(52).max(30);
    let popup_h = area.height.min(24).max(12);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        entry("h/l", "Previous/next day"),
        entry("\u{2191}/\u{2193}", "Previous/next week"),
        entry("[/]", "Previous/next month"),
        entry("t", "Jump to today"),
        entry("j/k", "Select event in list"),
        Line::from(""),
        Line::from(Span::styled("Events", section_style)),
        entry("n", "New event on selected day"),
        entry("Enter", "Event details"),
        entry("e", "Edit selected event"),
        entry("m", "Move selected event"),
        entry("d", "Delete selected event"),
        Line::from(""),
        Line::from(Span::styled("Search", section_style)),
        entry("/", "Search titles and notes"),
        entry("Esc", "Clear search"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  q", key_style),
            Span::styled(" / ", theme::DIM_STYLE),
            Span::styled("?       ", key_style),
            Span::raw("Quit / close help"),
        ]),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
