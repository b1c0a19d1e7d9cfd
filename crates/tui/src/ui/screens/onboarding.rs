use client::{
    OnboardingStep,
    onboarding::{INTEGRATIONS, ROLES, SCALES, USE_CASES},
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::{
    app::{AppState, OnboardingState},
    ui::{screens::login::centered_box, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let onboarding = &state.onboarding;
    let step = onboarding.wizard.step();

    let card = centered_box(60, 16, area);
    let block = Block::default()
        .title(format!(
            " Set up your workspace · {}/{} {} ",
            step.number(),
            OnboardingStep::ALL.len(),
            step.title()
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .margin(1)
        .split(inner);

    let body = match step {
        OnboardingStep::Workspace => workspace_lines(onboarding, &theme),
        OnboardingStep::UseCase => choice_lines(
            "What will you use Email Engine for?",
            &USE_CASES,
            onboarding.cursor,
            |value| onboarding.wizard.use_case.as_deref() == Some(value),
            &theme,
        ),
        OnboardingStep::Integrations => integration_lines(onboarding, &theme),
        OnboardingStep::Scale => choice_lines(
            "How many emails do you expect to send each month?",
            &SCALES,
            onboarding.cursor,
            |value| onboarding.wizard.scale.as_deref() == Some(value),
            &theme,
        ),
        OnboardingStep::Complete => vec![
            Line::from(Span::styled(
                "You're all set!",
                Style::default()
                    .fg(theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press Enter to open your dashboard."),
        ],
    };
    frame.render_widget(Paragraph::new(body), rows[0]);

    if let Some(message) = &onboarding.message {
        frame.render_widget(
            Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(theme.error),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
            rows[1],
        );
    }
}

fn workspace_lines<'a>(onboarding: &'a OnboardingState, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Workspace name  ", Style::default().fg(theme.dim)),
            Span::styled(
                format!("{}│", onboarding.wizard.workspace_name),
                Style::default().fg(theme.accent),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("Your role", Style::default().fg(theme.dim))),
    ];
    lines.extend(ROLES.iter().enumerate().map(|(index, role)| {
        let selected = onboarding.wizard.user_role.as_deref() == Some(*role);
        option_line(*role, index == onboarding.cursor, selected, "( )", "(•)", theme)
    }));
    lines
}

fn integration_lines<'a>(onboarding: &'a OnboardingState, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from("Where do your contacts live today?"),
        Line::from(""),
    ];
    lines.extend(INTEGRATIONS.iter().enumerate().map(|(index, (value, label))| {
        let selected = onboarding.wizard.integrations.iter().any(|v| v == value);
        option_line(*label, index == onboarding.cursor, selected, "[ ]", "[x]", theme)
    }));
    lines
}

fn choice_lines<'a>(
    question: &'a str,
    options: &'a [(&'a str, &'a str)],
    cursor: usize,
    is_selected: impl Fn(&str) -> bool,
    theme: &Theme,
) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(question), Line::from("")];
    lines.extend(options.iter().enumerate().map(|(index, (value, label))| {
        option_line(*label, index == cursor, is_selected(value), "( )", "(•)", theme)
    }));
    lines
}

fn option_line<'a>(
    label: &'a str,
    highlighted: bool,
    selected: bool,
    off: &'a str,
    on: &'a str,
    theme: &Theme,
) -> Line<'a> {
    let marker = if selected { on } else { off };
    let style = if highlighted {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    let pointer = if highlighted { "» " } else { "  " };
    Line::from(vec![
        Span::styled(pointer, style),
        Span::styled(format!("{marker} "), style),
        Span::styled(label, style),
    ])
}
