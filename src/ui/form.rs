use super::ACCENT;
use crate::app::{App, Field};
use crate::lang::Labels;
use crate::session::Counter;
use crate::state::{body_units, MAX_BODY_UNITS};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const CURSOR: &str = "▏";

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn input_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(title)
}

fn with_cursor(value: &str, focused: bool) -> String {
    if focused {
        format!("{}{}", value, CURSOR)
    } else {
        value.to_string()
    }
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let labels = app.session().state().labels();

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .title(Span::styled(
            labels.settings,
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let state = app.session().state();
    render_text_input(frame, rows[0], labels.name, state.name.as_deref(), app, Field::Name);
    render_text_input(
        frame,
        rows[1],
        labels.username,
        state.handle.as_deref(),
        app,
        Field::Handle,
    );
    render_body(frame, rows[2], labels, app);
    render_text_input(
        frame,
        rows[3],
        labels.avatar,
        Some(app.avatar_path()),
        app,
        Field::Avatar,
    );
    render_counters(frame, rows[4], labels, app);
    render_verified(frame, rows[5], labels, app);
    render_buttons(frame, rows[6], labels, app);
}

fn render_text_input(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: Option<&str>,
    app: &App,
    field: Field,
) {
    let focused = app.focus() == field;
    let labels = app.session().state().labels();
    let title = match field {
        Field::Avatar if focused => format!("{} - {}", label, labels.avatar_hint),
        Field::Handle if focused => format!("{} - {}", label, labels.fetch_hint),
        _ => label.to_string(),
    };
    let text = with_cursor(value.unwrap_or_default(), focused && app.editing_text());
    let paragraph = Paragraph::new(text).block(input_block(title, focused));
    frame.render_widget(paragraph, area);
}

fn render_body(frame: &mut Frame, area: Rect, labels: &Labels, app: &App) {
    let focused = app.focus() == Field::Body;
    let body = app.session().state().body.as_deref().unwrap_or_default();
    let title = format!("{} ({}/{})", labels.tweet, body_units(body), MAX_BODY_UNITS);

    let lines: Vec<Line> = with_cursor(body, focused)
        .split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect();

    // Keep the end of the text, where typing happens, in view.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    let paragraph = Paragraph::new(lines)
        .block(input_block(title, focused))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_counters(frame: &mut Frame, area: Rect, labels: &Labels, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let counters = [
        (Field::Retweets, Counter::Retweets, labels.retweets),
        (Field::Quotes, Counter::Quotes, labels.quote_tweets),
        (Field::Likes, Counter::Likes, labels.likes),
    ];

    for (idx, (field, counter, label)) in counters.into_iter().enumerate() {
        let focused = app.focus() == field;
        let raw = app.session().count(counter).raw();
        let paragraph = Paragraph::new(with_cursor(raw, focused))
            .block(input_block(label.to_string(), focused));
        frame.render_widget(paragraph, columns[idx]);
    }
}

fn render_verified(frame: &mut Frame, area: Rect, labels: &Labels, app: &App) {
    let focused = app.focus() == Field::Verified;
    let current = app.verified();

    let option = |verified: crate::state::Verified| {
        let selected = current == verified;
        let marker = if selected { "(•) " } else { "( ) " };
        let style = if selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(format!("{}{}", marker, verified.label(labels)), style)
    };

    let line = Line::from(vec![
        option(crate::state::Verified::Yes),
        Span::raw("   "),
        option(crate::state::Verified::No),
    ]);
    let paragraph =
        Paragraph::new(line).block(input_block(labels.verified.to_string(), focused));
    frame.render_widget(paragraph, area);
}

fn render_buttons(frame: &mut Frame, area: Rect, labels: &Labels, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (idx, (field, label)) in [(Field::Fetch, labels.fetch), (Field::Create, labels.create)]
        .into_iter()
        .enumerate()
    {
        let focused = app.focus() == field;
        let style = if focused {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(ACCENT)
        };
        let button = Paragraph::new(Span::styled(label, style))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style(focused)),
            );
        frame.render_widget(button, columns[idx]);
    }
}
