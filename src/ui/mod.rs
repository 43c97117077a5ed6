pub mod avatar;
pub mod form;
pub mod preview;

use crate::app::App;
use crate::capture::CapturePhase;
use crate::lang::Language;
use crate::session::StatusKind;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub const ACCENT: Color = Color::Rgb(29, 155, 240);

pub fn render(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_language_bar(frame, rows[0], app.session().state().language);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(rows[1]);

    form::render(frame, columns[0], app);
    preview::render(frame, columns[1], app);

    render_status(frame, rows[2], app);

    let help = Paragraph::new(Line::from(Span::styled(
        app.session().state().labels().key_help,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, rows[3]);
}

fn render_language_bar(frame: &mut Frame, area: Rect, current: Language) {
    let mut spans = Vec::new();
    for (idx, language) in Language::ALL.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *language == current {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(language.labels().language_name, style));
    }

    let bar = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(bar, area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let session = app.session();

    let labels = session.state().labels();

    let line = match (session.capture_phase(), session.status()) {
        (CapturePhase::Capturing, _) => Line::from(Span::styled(
            format!("{}...", labels.status_rendering),
            Style::default().fg(Color::Yellow),
        )),
        (_, Some(status)) => {
            let color = match status.kind {
                StatusKind::Info => Color::Green,
                StatusKind::Warning => Color::Yellow,
                StatusKind::Error => Color::Red,
            };
            Line::from(Span::styled(status.text.as_str(), Style::default().fg(color)))
        }
        (_, None) => Line::from(""),
    };

    frame.render_widget(Paragraph::new(line), area);
}
