use api_types::campaign::CampaignStatus;
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{app::AppState, ui::theme::Theme};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_header(frame, layout[0], state, &theme);
    render_list(frame, layout[1], state, &theme);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let campaigns = &state.campaigns;
    let mut line = vec![
        Span::styled("Campaigns", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}", campaigns.items.len())),
    ];
    if let Some(err) = &campaigns.error {
        line.push(Span::raw("   "));
        line.push(Span::styled(err.as_str(), Style::default().fg(theme.error)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Campaigns ");
    frame.render_widget(Paragraph::new(Line::from(line)).block(block), area);
}

fn render_list(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let campaigns = &state.campaigns;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if campaigns.items.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from("No campaigns yet. Press n to create one."))
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme.dim))
                .block(block),
            area,
        );
        return;
    }

    let items = campaigns
        .items
        .iter()
        .map(|campaign| {
            let created = campaign
                .created_at
                .as_deref()
                .map(|raw| format_timestamp(raw, state.timezone))
                .unwrap_or_else(|| "-".to_string());
            let status = campaign.status.as_str();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{created:<18}"), Style::default().fg(theme.dim)),
                Span::styled(format!("{status:<10}"), status_style(campaign.status, theme)),
                Span::raw(format!("{}  ", campaign.name)),
                Span::styled(campaign.subject.clone(), Style::default().fg(theme.dim)),
            ]))
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(campaigns.selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn status_style(status: CampaignStatus, theme: &Theme) -> Style {
    match status {
        CampaignStatus::Sent => Style::default().fg(theme.success),
        CampaignStatus::Sending | CampaignStatus::Scheduled => Style::default().fg(theme.accent),
        CampaignStatus::Paused | CampaignStatus::Cancelled => Style::default().fg(theme.warning),
        CampaignStatus::Draft => Style::default().fg(theme.text),
    }
}

/// Renders a backend timestamp in `timezone`. Timestamps without an offset
/// are UTC; anything unparsable is shown as is.
pub fn format_timestamp(raw: &str, timezone: Tz) -> String {
    const FORMAT: &str = "%d %b %Y %H:%M";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&timezone).format(FORMAT).to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive
            .and_utc()
            .with_timezone(&timezone)
            .format(FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}
