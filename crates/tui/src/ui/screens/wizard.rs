use client::{LaunchStatus, WizardStep};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
    app::{AppState, DetailsField, WizardState, launch_label},
    ui::{screens::login::centered_box, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let wizard = &state.wizard;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Step indicator
            Constraint::Min(0),    // Step body
            Constraint::Length(3), // Messages
        ])
        .split(area);

    render_steps(frame, layout[0], wizard.wizard.step(), &theme);

    if let LaunchStatus::Success { .. } = wizard.wizard.status() {
        render_success(frame, layout[1], &wizard.wizard.draft().name, &theme);
        return;
    }

    match wizard.wizard.step() {
        WizardStep::Details => render_details(frame, layout[1], wizard, &theme),
        WizardStep::Audience => {
            let rows = wizard
                .visible_audiences()
                .into_iter()
                .map(|list| {
                    let selected = wizard
                        .wizard
                        .draft()
                        .audience
                        .as_ref()
                        .is_some_and(|a| a.list_id == list.id);
                    row(
                        selected,
                        &list.name,
                        format!("{} · {} contacts", list.kind, list.count),
                        &theme,
                    )
                })
                .collect();
            render_search(frame, layout[1], " Select audience ", wizard, rows, &theme);
        }
        WizardStep::Content => {
            let rows = wizard
                .visible_templates()
                .into_iter()
                .map(|template| {
                    let selected = wizard
                        .wizard
                        .draft()
                        .template
                        .as_ref()
                        .is_some_and(|t| t.template_id == template.id);
                    row(selected, &template.name, template.subject.clone(), &theme)
                })
                .collect();
            render_search(frame, layout[1], " Choose template ", wizard, rows, &theme);
        }
        WizardStep::Review => render_review(frame, layout[1], wizard, &theme),
    }

    render_message(frame, layout[2], wizard, &theme);
}

fn render_steps(frame: &mut Frame<'_>, area: Rect, current: WizardStep, theme: &Theme) {
    let mut spans = Vec::new();
    for (index, step) in WizardStep::ALL.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled("  ──  ", Style::default().fg(theme.border)));
        }
        let style = if *step == current {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else if step.index() < current.index() {
            Style::default().fg(theme.success)
        } else {
            Style::default().fg(theme.dim)
        };
        spans.push(Span::styled(
            format!("{} {}", step.index(), step.title()),
            style,
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" New campaign ");
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_details(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let draft = wizard.wizard.draft();
    let field = |label: &'static str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        let cursor = if focused { "│" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(theme.dim)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let lines = vec![
        field(
            "Campaign name",
            &draft.name,
            wizard.focus == DetailsField::Name,
        ),
        Line::from(""),
        field(
            "Subject line",
            &draft.subject,
            wizard.focus == DetailsField::Subject,
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Campaign details ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn row<'a>(selected: bool, name: &'a str, detail: String, theme: &Theme) -> ListItem<'a> {
    let marker = if selected { "(•) " } else { "( ) " };
    ListItem::new(Line::from(vec![
        Span::raw(marker),
        Span::raw(name),
        Span::styled(format!("  {detail}"), Style::default().fg(theme.dim)),
    ]))
}

fn render_search(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    wizard: &WizardState,
    rows: Vec<ListItem<'_>>,
    theme: &Theme,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Search ");
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{}│", wizard.query),
            Style::default().fg(theme.accent),
        ))
        .block(search),
        layout[0],
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title.to_string());

    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("Nothing matches your search.")
                .style(Style::default().fg(theme.dim))
                .alignment(Alignment::Center)
                .block(block),
            layout[1],
        );
        return;
    }

    let mut list_state = ListState::default();
    list_state.select(Some(wizard.selected));
    let list = List::new(rows)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, layout[1], &mut list_state);
}

fn render_review(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let draft = wizard.wizard.draft();
    let status = wizard.wizard.status();
    let entry = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(theme.dim)),
            Span::styled(value, Style::default().fg(theme.text)),
        ])
    };
    let missing = || "-".to_string();

    let button_style = if status.is_in_flight() {
        Style::default().fg(theme.dim)
    } else {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    };

    let lines = vec![
        entry("Name", draft.name.clone()),
        entry("Subject", draft.subject.clone()),
        entry(
            "Audience",
            draft
                .audience
                .as_ref()
                .map(|a| a.list_name.clone())
                .unwrap_or_else(missing),
        ),
        entry(
            "Template",
            draft
                .template
                .as_ref()
                .map(|t| t.template_name.clone())
                .unwrap_or_else(missing),
        ),
        entry(
            "Schedule",
            draft
                .scheduled_at
                .map(|at| at.format("%d %b %Y %H:%M UTC").to_string())
                .unwrap_or_else(|| "Send now".to_string()),
        ),
        Line::from(""),
        Line::from(Span::styled(
            format!("[ {} ]", launch_label(status)),
            button_style,
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(" Review and launch ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_success(frame: &mut Frame<'_>, area: Rect, name: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            "Campaign Launched!",
            Style::default()
                .fg(theme.success)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "'{name}' has been queued for sending. Redirecting to campaigns..."
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        centered_box(60, 5, area),
    );
}

fn render_message(frame: &mut Frame<'_>, area: Rect, wizard: &WizardState, theme: &Theme) {
    let line = match wizard.wizard.status() {
        LaunchStatus::Error {
            message,
            partial: Some(id),
        } => Line::from(Span::styled(
            format!("{message}. Campaign {id} was saved as a draft; Enter retries."),
            Style::default().fg(theme.warning),
        )),
        LaunchStatus::Error { message, .. } => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(theme.error),
        )),
        _ => match &wizard.message {
            Some(message) => Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(theme.error),
            )),
            None => return,
        },
    };
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

/// Draws the in-flight launch over whatever screen is showing.
pub fn render_progress(frame: &mut Frame<'_>, name: &str, status: &LaunchStatus) {
    let theme = Theme::default();
    let area = centered_box(48, 5, frame.area());
    frame.render_widget(Clear, area);

    let (text, style) = match status {
        LaunchStatus::Success { .. } => ("Campaign Launched!", Style::default().fg(theme.success)),
        LaunchStatus::Error { message, .. } => (message.as_str(), Style::default().fg(theme.error)),
        other => (launch_label(other), Style::default().fg(theme.accent)),
    };

    let block = Block::default()
        .title(format!(" {name} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}
