pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Screen};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, state),
        Screen::Onboarding | Screen::Campaigns | Screen::Wizard => {
            render_shell(frame, area, state)
        }
    }
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Min(0),    // Screen
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    match state.screen {
        Screen::Onboarding => screens::onboarding::render(frame, layout[1], state),
        Screen::Campaigns => screens::campaigns::render(frame, layout[1], state),
        Screen::Wizard => screens::wizard::render(frame, layout[1], state),
        Screen::Login => {}
    }
    render_hints(frame, layout[2], state, &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(session) = &state.session else {
        return;
    };

    let line = Line::from(vec![
        Span::styled("Tenant", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", session.tenant_id)),
        Span::styled("User", Style::default().fg(theme.dim)),
        Span::raw(format!(": {} ({})  ", session.full_name, session.role)),
        Span::styled("Status", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", session.tenant_status.as_str())),
        Span::styled("API", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}", state.base_url)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_hints(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let hints: &[(&str, &str)] = match state.screen {
        Screen::Campaigns => &[
            ("n", "new campaign"),
            ("r", "refresh"),
            ("l", "logout"),
            ("q", "quit"),
        ],
        Screen::Onboarding => &[
            ("↑↓", "choose"),
            ("Space", "toggle"),
            ("Enter", "continue"),
            ("Esc", "back"),
        ],
        Screen::Wizard => &[
            ("Tab", "next field"),
            ("↑↓", "select"),
            ("Enter", "continue"),
            ("Esc", "back"),
        ],
        Screen::Login => &[],
    };

    let mut parts = Vec::new();
    for (index, (key, action)) in hints.iter().enumerate() {
        if index > 0 {
            parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
        }
        parts.push(Span::styled(*key, Style::default().fg(theme.accent)));
        parts.push(Span::raw(format!(" {action}")));
    }
    parts.push(Span::styled("  │  ", Style::default().fg(theme.border)));
    parts.push(Span::styled("Ctrl+C", Style::default().fg(theme.accent)));
    parts.push(Span::raw(" exit"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
