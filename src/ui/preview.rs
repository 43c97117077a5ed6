use super::ACCENT;
use crate::app::{App, AVATAR_PREVIEW_SIZE};
use crate::format::{FormattedBody, SegmentKind};
use crate::state::PreviewState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const VERIFIED_BADGE: &str = " ✓";
const ACTIONS: &str = "  ↩      ⇄      ♡      ⇪";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.session().state();
    let labels = state.labels();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(Span::styled(
            labels.preview,
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let avatar_rows = (AVATAR_PREVIEW_SIZE / 2) as u16;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(avatar_rows),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_header(frame, rows[0], app);

    let body = Paragraph::new(body_lines(&state.formatted_body(), labels.body_placeholder))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, rows[2]);

    frame.render_widget(divider(rows[3].width), rows[3]);
    frame.render_widget(Paragraph::new(stats_line(state)), rows[4]);
    frame.render_widget(divider(rows[5].width), rows[5]);
    frame.render_widget(
        Paragraph::new(Span::styled(ACTIONS, Style::default().fg(Color::Gray))),
        rows[6],
    );

    if let Some(path) = app.session().last_export() {
        let saved = Line::from(vec![
            Span::styled(
                format!("{}: ", labels.download),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Green)),
        ]);
        frame.render_widget(Paragraph::new(saved), rows[7]);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.session().state();
    let avatar_width = app
        .avatar_pixels()
        .map(|pixels| pixels.width())
        .unwrap_or(AVATAR_PREVIEW_SIZE as u16);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(avatar_width),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let avatar = match app.avatar_pixels() {
        Some(pixels) => Paragraph::new(pixels.lines()),
        None => {
            let row = "░".repeat(avatar_width as usize);
            let lines: Vec<Line> = (0..area.height)
                .map(|_| Line::styled(row.clone(), Style::default().fg(Color::DarkGray)))
                .collect();
            Paragraph::new(lines)
        }
    };
    frame.render_widget(avatar, columns[0]);

    let mut name = vec![Span::styled(
        state.display_name().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if state.verified.is_verified() {
        name.push(Span::styled(VERIFIED_BADGE, Style::default().fg(ACCENT)));
    }

    let identity = Paragraph::new(vec![
        Line::from(name),
        Line::from(Span::styled(
            state.display_handle(),
            Style::default().fg(Color::Gray),
        )),
    ]);
    frame.render_widget(identity, columns[2]);
}

/// Body runs as styled lines; highlighted kinds take the accent colour.
fn body_lines(body: &FormattedBody, placeholder: &'static str) -> Vec<Line<'static>> {
    if body.is_placeholder() {
        return vec![Line::styled(placeholder, Style::default().fg(Color::DarkGray))];
    }

    body.lines()
        .into_iter()
        .map(|line| {
            let spans: Vec<Span<'static>> = line
                .into_iter()
                .map(|segment| match segment.kind {
                    kind if kind.is_highlighted() => {
                        Span::styled(segment.text.clone(), Style::default().fg(ACCENT))
                    }
                    SegmentKind::LineBreak => Span::raw(""),
                    _ => Span::raw(segment.text.clone()),
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn stats_line(state: &PreviewState) -> Line<'static> {
    let labels = state.labels();
    let stats = [
        (state.retweets.display(), labels.retweets),
        (state.quotes.display(), labels.quote_tweets),
        (state.likes.display(), labels.likes),
    ];

    let mut spans = Vec::new();
    for (idx, (count, label)) in stats.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(count, Style::default().add_modifier(Modifier::BOLD)));
        spans.push(Span::styled(
            format!(" {}", label),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

fn divider(width: u16) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(Color::DarkGray),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_body;
    use crate::lang::Language;
    use crate::state::CountField;

    #[test]
    fn test_body_lines_highlight_tags() {
        let lines = body_lines(&format_body(Some("hi @ada\n#rust")), "placeholder");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "hi ");
        assert_eq!(lines[0].spans[1].content, "@ada");
        assert_eq!(lines[0].spans[1].style.fg, Some(ACCENT));
        assert_eq!(lines[1].spans[0].content, "#rust");
        assert_eq!(lines[1].spans[0].style.fg, Some(ACCENT));
    }

    #[test]
    fn test_body_lines_placeholder() {
        let lines = body_lines(&format_body(Some("")), "Bu alana örnek tweet gelecek");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].content, "Bu alana örnek tweet gelecek");
    }

    #[test]
    fn test_stats_line_uses_formatted_counts() {
        let state = PreviewState {
            retweets: CountField::new("1500"),
            likes: CountField::new("999"),
            language: Language::En,
            ..PreviewState::default()
        };
        let text: String = stats_line(&state)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(text, "1 B Retweets   0 Quote Tweets   999 Likes");
    }
}
