use regex::Regex;
use std::sync::LazyLock;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]+").expect("mention pattern"));

// Turkish letters are listed in both cases; `(?i)` would also pull in the
// Kelvin sign and long s through Unicode folding.
static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z0-9_şŞçÇöÖğĞüÜıİ]+").expect("hashtag pattern"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[A-Za-z0-9_./]+").expect("link pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Mention,
    Hashtag,
    Link,
    LineBreak,
}

impl SegmentKind {
    /// Mentions, hashtags and links are drawn in the accent colour.
    pub fn is_highlighted(self) -> bool {
        matches!(self, Self::Mention | Self::Hashtag | Self::Link)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A post body split into typed runs. User text is never interpreted as
/// markup; renderers decide how each kind looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedBody {
    /// The body is empty; renderers show the localized placeholder.
    Placeholder,
    Rich(Vec<Segment>),
}

/// Split a raw post body into plain, mention, hashtag, link and line-break
/// segments.
///
/// The passes run in a fixed order and each only looks at text that is
/// still plain: mentions, then hashtags, then the first URL, then newlines.
/// Only the first URL of the body becomes a link.
pub fn format_body(body: Option<&str>) -> FormattedBody {
    let body = match body {
        Some(body) if !body.is_empty() => body,
        _ => return FormattedBody::Placeholder,
    };

    let segments = vec![Segment::new(SegmentKind::Plain, body)];
    let segments = tag_matches(segments, &MENTION, SegmentKind::Mention, usize::MAX);
    let segments = tag_matches(segments, &HASHTAG, SegmentKind::Hashtag, usize::MAX);
    let segments = tag_matches(segments, &LINK, SegmentKind::Link, 1);
    FormattedBody::Rich(split_line_breaks(segments))
}

fn push_plain(out: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        out.push(Segment::new(SegmentKind::Plain, text));
    }
}

fn tag_matches(
    segments: Vec<Segment>,
    pattern: &Regex,
    kind: SegmentKind,
    limit: usize,
) -> Vec<Segment> {
    let mut remaining = limit;
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        if segment.kind != SegmentKind::Plain || remaining == 0 {
            out.push(segment);
            continue;
        }

        let mut last = 0;
        for found in pattern.find_iter(&segment.text) {
            if remaining == 0 {
                break;
            }
            push_plain(&mut out, &segment.text[last..found.start()]);
            out.push(Segment::new(kind, found.as_str()));
            last = found.end();
            remaining -= 1;
        }
        push_plain(&mut out, &segment.text[last..]);
    }

    out
}

fn split_line_breaks(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        if segment.kind != SegmentKind::Plain || !segment.text.contains('\n') {
            out.push(segment);
            continue;
        }

        for (idx, part) in segment.text.split('\n').enumerate() {
            if idx > 0 {
                out.push(Segment::new(SegmentKind::LineBreak, "\n"));
            }
            push_plain(&mut out, part);
        }
    }

    out
}

impl FormattedBody {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn segments(&self) -> &[Segment] {
        match self {
            Self::Placeholder => &[],
            Self::Rich(segments) => segments,
        }
    }

    /// Segments grouped into visual lines. A body ending in a newline yields
    /// a trailing empty line, as a textarea would show it.
    pub fn lines(&self) -> Vec<Vec<&Segment>> {
        let mut lines = vec![Vec::new()];
        for segment in self.segments() {
            if segment.kind == SegmentKind::LineBreak {
                lines.push(Vec::new());
            } else if let Some(line) = lines.last_mut() {
                line.push(segment);
            }
        }
        if self.is_placeholder() {
            lines.clear();
        }
        lines
    }

    /// Legacy markup: highlighted runs wrapped in `<span>`, newlines as
    /// `<br />`, and all user text HTML-escaped.
    pub fn to_markup(&self, placeholder: &str) -> String {
        if self.is_placeholder() {
            return escape_html(placeholder);
        }

        let mut markup = String::new();
        for segment in self.segments() {
            match segment.kind {
                SegmentKind::Plain => markup.push_str(&escape_html(&segment.text)),
                SegmentKind::LineBreak => markup.push_str("<br />"),
                SegmentKind::Mention | SegmentKind::Hashtag | SegmentKind::Link => {
                    markup.push_str("<span>");
                    markup.push_str(&escape_html(&segment.text));
                    markup.push_str("</span>");
                }
            }
        }
        markup
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
