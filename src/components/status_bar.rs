use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::InputMode;
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        mode: InputMode,
        search_term: &str,
        message: Option<&str>,
    ) {
        let w = area.width as usize;

        // The search prompt replaces the mode label while typing or filtering
        let (left, left_style) = match mode {
            InputMode::Search => (format!(" /{}_ ", search_term), theme::current().search),
            _ if !search_term.is_empty() => (format!(" /{} ", search_term), theme::current().search),
            InputMode::Form => (" [Event] ".to_string(), theme::current().status),
            InputMode::Move => (" [Move] ".to_string(), theme::current().status),
            InputMode::Normal => (" [Month] ".to_string(), theme::current().status),
        };

        let right = match message {
            Some(msg) => format!(" {} ", msg),
            None => hints(mode, !search_term.is_empty(), w).to_string(),
        };

        let padding = " ".repeat(w.saturating_sub(left.len() + right.len()));

        let line = Line::from(vec![
            Span::styled(left, left_style),
            Span::styled(padding, theme::current().status),
            Span::styled(right, theme::current().status),
        ]);

        let bar = Paragraph::new(line).style(theme::current().status);
        frame.render_widget(bar, area);
    }
}

fn hints(mode: InputMode, searching: bool, w: usize) -> &'static str {
    match mode {
        InputMode::Search => " Enter:Keep Esc:Clear ",
        InputMode::Form => " Tab:Next Enter:Save Esc:Cancel ",
        InputMode::Move if w >= 60 => " hjkl:Pick day [/]:Month Enter:Drop Esc:Cancel ",
        InputMode::Move => " Enter:Drop Esc:Cancel ",
        InputMode::Normal if searching && w >= 60 => " jk:Select Enter:Detail Esc:Clear search ?:Help ",
        InputMode::Normal if w >= 90 => {
            " hl:Day \u{2191}\u{2193}:Week [/]:Month /:Search n:New e:Edit m:Move d:Del ?:Help q:Quit "
        }
        InputMode::Normal if w >= 50 => " /:Search n:New ?:Help q:Quit ",
        InputMode::Normal => " ?:Help q:Quit ",
    }
}
