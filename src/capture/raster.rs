//! Draws the preview card into an RGBA image.
//!
//! Sizes are expressed in card units and multiplied by the export scale.
//! Text uses the 8x8 bitmap font drawn at twice its size.

use crate::error::CaptureError;
use crate::format::{FormattedBody, SegmentKind};
use crate::state::PreviewState;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use textwrap::core::break_words;
use textwrap::wrap_algorithms::wrap_first_fit;
use textwrap::WordSeparator;

const CARD_WIDTH: u32 = 600;
const PADDING: u32 = 24;
const AVATAR_SIZE: u32 = 48;
const GLYPH: u32 = 8;
const TEXT_SCALE: u32 = 2;
const CHAR_WIDTH: u32 = GLYPH * TEXT_SCALE;
const LINE_GAP: u32 = 6;
const LINE_HEIGHT: u32 = CHAR_WIDTH + LINE_GAP;
const BADGE_SIZE: u32 = 18;
const ICON_SIZE: u32 = 18;
const SECTION_GAP: u32 = 14;

/// Characters that fit on one body line.
const BODY_COLUMNS: usize = ((CARD_WIDTH - 2 * PADDING) / CHAR_WIDTH) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CardTheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Rgba<u8>,
    text: Rgba<u8>,
    secondary: Rgba<u8>,
    accent: Rgba<u8>,
    divider: Rgba<u8>,
    avatar_placeholder: Rgba<u8>,
}

impl CardTheme {
    fn palette(self) -> Palette {
        match self {
            CardTheme::Light => Palette {
                background: Rgba([255, 255, 255, 255]),
                text: Rgba([15, 20, 25, 255]),
                secondary: Rgba([83, 100, 113, 255]),
                accent: Rgba([29, 155, 240, 255]),
                divider: Rgba([239, 243, 244, 255]),
                avatar_placeholder: Rgba([207, 217, 222, 255]),
            },
            CardTheme::Dark => Palette {
                background: Rgba([0, 0, 0, 255]),
                text: Rgba([231, 233, 234, 255]),
                secondary: Rgba([113, 118, 123, 255]),
                accent: Rgba([29, 155, 240, 255]),
                divider: Rgba([47, 51, 54, 255]),
                avatar_placeholder: Rgba([51, 54, 57, 255]),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub scale: u32,
    pub theme: CardTheme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            theme: CardTheme::Light,
        }
    }
}

/// One wrapped line of body text: characters with the kind they came from.
type BodyLine = Vec<(char, SegmentKind)>;

/// Rasterize the card and encode it as PNG bytes.
pub fn capture_png(state: &PreviewState, options: RenderOptions) -> Result<Vec<u8>, CaptureError> {
    let img = render_card(state, options)?;
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(CaptureError::Encode)?;
    Ok(png)
}

pub fn render_card(state: &PreviewState, options: RenderOptions) -> Result<RgbaImage, CaptureError> {
    let palette = options.theme.palette();
    let labels = state.labels();

    // Decode first so a broken avatar fails before any drawing happens.
    let avatar = match &state.avatar {
        Some(avatar) => Some(avatar.decode()?),
        None => None,
    };

    let body = state.formatted_body();
    let body_lines = match &body {
        FormattedBody::Placeholder => wrap_line(
            &labels
                .body_placeholder
                .chars()
                .map(|c| (c, SegmentKind::Plain))
                .collect::<Vec<_>>(),
        ),
        FormattedBody::Rich(_) => body
            .lines()
            .iter()
            .flat_map(|line| {
                let chars: Vec<(char, SegmentKind)> = line
                    .iter()
                    .flat_map(|s| s.text.chars().map(move |c| (c, s.kind)))
                    .collect();
                wrap_line(&chars)
            })
            .collect(),
    };

    let stats = [
        (state.retweets.display(), labels.retweets),
        (state.quotes.display(), labels.quote_tweets),
        (state.likes.display(), labels.likes),
    ];
    let stat_rows = flow_stats(&stats);

    let body_top = PADDING + AVATAR_SIZE + 16;
    let first_divider = body_top + body_lines.len() as u32 * LINE_HEIGHT + SECTION_GAP;
    let stats_top = first_divider + 1 + SECTION_GAP;
    let stats_height = stat_rows.len() as u32 * LINE_HEIGHT - LINE_GAP;
    let second_divider = stats_top + stats_height + SECTION_GAP;
    let icons_top = second_divider + 1 + 12;
    let height = icons_top + ICON_SIZE + PADDING;

    let mut canvas = Canvas::new(CARD_WIDTH, height, options.scale.max(1), palette.background);

    // Header
    match &avatar {
        Some(img) => canvas.draw_avatar(PADDING, PADDING, AVATAR_SIZE, img, palette.background),
        None => {
            let r = AVATAR_SIZE as f64 / 2.0;
            canvas.fill_circle(
                PADDING as f64 + r,
                PADDING as f64 + r,
                r,
                palette.avatar_placeholder,
            );
        }
    }

    let name_x = PADDING + AVATAR_SIZE + 12;
    let name_y = PADDING + 4;
    let name_columns =
        ((CARD_WIDTH - PADDING - name_x - BADGE_SIZE - 8) / CHAR_WIDTH) as usize;
    let name = truncate(state.display_name(), name_columns);
    let name_end = canvas.draw_text(name_x, name_y, &name, palette.text, true);

    if state.verified.is_verified() {
        canvas.draw_badge(name_end + 6, name_y - 1, palette.accent, palette.background);
    }

    let handle_columns = ((CARD_WIDTH - PADDING - name_x) / CHAR_WIDTH) as usize;
    let handle = truncate(&state.display_handle(), handle_columns);
    canvas.draw_text(name_x, name_y + CHAR_WIDTH + LINE_GAP, &handle, palette.secondary, false);

    // Body
    let body_color = |kind: SegmentKind| {
        if body.is_placeholder() {
            palette.secondary
        } else if kind.is_highlighted() {
            palette.accent
        } else {
            palette.text
        }
    };
    for (row, line) in body_lines.iter().enumerate() {
        let y = body_top + row as u32 * LINE_HEIGHT;
        let mut x = PADDING;
        for &(c, kind) in line {
            canvas.draw_char(x, y, c, body_color(kind), false);
            x += CHAR_WIDTH;
        }
    }

    // Stats
    canvas.fill_rect(PADDING, first_divider, CARD_WIDTH - 2 * PADDING, 1, palette.divider);
    for (row, items) in stat_rows.iter().enumerate() {
        let y = stats_top + row as u32 * LINE_HEIGHT;
        let mut x = PADDING;
        for (count, label) in items {
            x = canvas.draw_text(x, y, count, palette.text, true);
            x = canvas.draw_text(x + CHAR_WIDTH, y, label, palette.secondary, false);
            x += 2 * CHAR_WIDTH;
        }
    }
    canvas.fill_rect(PADDING, second_divider, CARD_WIDTH - 2 * PADDING, 1, palette.divider);

    // Actions
    let span = (CARD_WIDTH - 2 * PADDING) as f64;
    let cy = icons_top as f64 + ICON_SIZE as f64 / 2.0;
    let icon_x = |i: u32| PADDING as f64 + span * (2 * i + 1) as f64 / 8.0;
    canvas.draw_reply_icon(icon_x(0), cy, palette.secondary);
    canvas.draw_retweet_icon(icon_x(1), cy, palette.secondary);
    canvas.draw_like_icon(icon_x(2), cy, palette.secondary, palette.background);
    canvas.draw_share_icon(icon_x(3), cy, palette.secondary);

    Ok(canvas.img)
}

/// Greedy word wrap of one logical line, breaking words longer than a line.
fn wrap_line(chars: &[(char, SegmentKind)]) -> Vec<BodyLine> {
    let text: String = chars.iter().map(|(c, _)| *c).collect();

    let mut kinds = Vec::with_capacity(text.len());
    for &(c, kind) in chars {
        kinds.extend(std::iter::repeat(kind).take(c.len_utf8()));
    }

    let words = break_words(WordSeparator::AsciiSpace.find_words(&text), BODY_COLUMNS);
    if words.is_empty() {
        return vec![Vec::new()];
    }

    let mut lines = Vec::new();
    let mut offset = 0;
    for wrapped in wrap_first_fit(&words, &[BODY_COLUMNS as f64]) {
        let mut line = BodyLine::new();
        for (idx, word) in wrapped.iter().enumerate() {
            push_run(&mut line, word.word, offset, &kinds);
            offset += word.word.len();
            if idx + 1 < wrapped.len() {
                push_run(&mut line, word.whitespace, offset, &kinds);
            }
            offset += word.whitespace.len();
        }
        lines.push(line);
    }
    lines
}

fn push_run(line: &mut BodyLine, run: &str, offset: usize, kinds: &[SegmentKind]) {
    for (idx, c) in run.char_indices() {
        let kind = kinds.get(offset + idx).copied().unwrap_or(SegmentKind::Plain);
        line.push((c, kind));
    }
}

/// Lays the stat items out in rows that fit the card width.
fn flow_stats<'a>(stats: &'a [(String, &'static str)]) -> Vec<Vec<(&'a str, &'static str)>> {
    let columns = BODY_COLUMNS;
    let mut rows: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
    let mut used = 0;

    for (count, label) in stats {
        let width = count.chars().count() + 1 + label.chars().count();
        let needed = if used == 0 { width } else { used + 2 + width };
        if used > 0 && needed > columns {
            rows.push(Vec::new());
            used = width;
        } else {
            used = needed;
        }
        if let Some(row) = rows.last_mut() {
            row.push((count.as_str(), *label));
        }
    }
    rows
}

fn truncate(text: &str, columns: usize) -> String {
    if text.chars().count() <= columns {
        return text.to_string();
    }
    let keep = columns.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| fold_letter(c).and_then(|base| BASIC_FONTS.get(base)))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Letters missing from the bitmap font, drawn as their unaccented base.
fn fold_letter(c: char) -> Option<char> {
    Some(match c {
        'ş' => 's',
        'Ş' => 'S',
        'ğ' => 'g',
        'Ğ' => 'G',
        'ı' => 'i',
        'İ' => 'I',
        '’' | '‘' => '\'',
        '“' | '”' => '"',
        '–' | '—' => '-',
        '…' => '.',
        _ => return None,
    })
}

struct Canvas {
    img: RgbaImage,
    scale: u32,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: u32, background: Rgba<u8>) -> Self {
        Self {
            img: RgbaImage::from_pixel(width * scale, height * scale, background),
            scale,
        }
    }

    fn s(&self) -> f64 {
        self.scale as f64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        let s = self.scale as i64;
        for py in (y as i64 * s)..((y + h) as i64 * s) {
            for px in (x as i64 * s)..((x + w) as i64 * s) {
                self.put(px, py, color);
            }
        }
    }

    /// Paints every device pixel in the box whose centre passes `inside`.
    fn for_each_pixel(
        &mut self,
        (x0, y0, x1, y1): (f64, f64, f64, f64),
        mut inside: impl FnMut(f64, f64) -> bool,
        color: Rgba<u8>,
    ) {
        let s = self.s();
        let (px0, py0) = ((x0 * s).floor() as i64, (y0 * s).floor() as i64);
        let (px1, py1) = ((x1 * s).ceil() as i64, (y1 * s).ceil() as i64);
        for py in py0..=py1 {
            for px in px0..=px1 {
                let (ux, uy) = ((px as f64 + 0.5) / s, (py as f64 + 0.5) / s);
                if inside(ux, uy) {
                    self.put(px, py, color);
                }
            }
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba<u8>) {
        self.for_each_pixel(
            (cx - r, cy - r, cx + r, cy + r),
            |x, y| (x - cx).powi(2) + (y - cy).powi(2) <= r * r,
            color,
        );
    }

    fn ring(&mut self, cx: f64, cy: f64, r: f64, thickness: f64, color: Rgba<u8>) {
        let inner = r - thickness;
        self.for_each_pixel(
            (cx - r, cy - r, cx + r, cy + r),
            |x, y| {
                let d = (x - cx).powi(2) + (y - cy).powi(2);
                d <= r * r && d >= inner * inner
            },
            color,
        );
    }

    fn fill_triangle(&mut self, a: (f64, f64), b: (f64, f64), c: (f64, f64), color: Rgba<u8>) {
        let edge = |p: (f64, f64), q: (f64, f64), x: f64, y: f64| {
            (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
        };
        let bounds = (
            a.0.min(b.0).min(c.0),
            a.1.min(b.1).min(c.1),
            a.0.max(b.0).max(c.0),
            a.1.max(b.1).max(c.1),
        );
        self.for_each_pixel(
            bounds,
            |x, y| {
                let (e1, e2, e3) = (edge(a, b, x, y), edge(b, c, x, y), edge(c, a, x, y));
                (e1 >= 0.0 && e2 >= 0.0 && e3 >= 0.0) || (e1 <= 0.0 && e2 <= 0.0 && e3 <= 0.0)
            },
            color,
        );
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), thickness: f64, color: Rgba<u8>) {
        let r = thickness / 2.0;
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;
        let bounds = (
            from.0.min(to.0) - r,
            from.1.min(to.1) - r,
            from.0.max(to.0) + r,
            from.1.max(to.1) + r,
        );
        self.for_each_pixel(
            bounds,
            |x, y| {
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    (((x - from.0) * dx + (y - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let (nx, ny) = (from.0 + t * dx, from.1 + t * dy);
                (x - nx).powi(2) + (y - ny).powi(2) <= r * r
            },
            color,
        );
    }

    fn polyline(&mut self, points: &[(f64, f64)], thickness: f64, color: Rgba<u8>) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], thickness, color);
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, c: char, color: Rgba<u8>, bold: bool) {
        let cell = (TEXT_SCALE * self.scale) as i64;
        let (ox, oy) = ((x * self.scale) as i64, (y * self.scale) as i64);
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..8i64 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let extra = if bold { self.scale as i64 } else { 0 };
                for dy in 0..cell {
                    for dx in 0..cell + extra {
                        self.put(ox + col * cell + dx, oy + row as i64 * cell + dy, color);
                    }
                }
            }
        }
    }

    /// Draws `text` left to right and returns the x just past it.
    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Rgba<u8>, bold: bool) -> u32 {
        let mut cursor = x;
        for c in text.chars() {
            self.draw_char(cursor, y, c, color, bold);
            cursor += CHAR_WIDTH;
        }
        cursor
    }

    fn draw_avatar(&mut self, x: u32, y: u32, size: u32, img: &DynamicImage, bg: Rgba<u8>) {
        let side = size * self.scale;
        let pixels = img.resize_to_fill(side, side, FilterType::Triangle).to_rgba8();
        let r = side as f64 / 2.0;
        let (ox, oy) = ((x * self.scale) as i64, (y * self.scale) as i64);

        for (px, py, pixel) in pixels.enumerate_pixels() {
            let (dx, dy) = (px as f64 + 0.5 - r, py as f64 + 0.5 - r);
            if dx * dx + dy * dy <= r * r {
                self.put(ox + px as i64, oy + py as i64, blend(bg, *pixel));
            }
        }
    }

    fn draw_badge(&mut self, x: u32, y: u32, fill: Rgba<u8>, check: Rgba<u8>) {
        let r = BADGE_SIZE as f64 / 2.0;
        let (cx, cy) = (x as f64 + r, y as f64 + r);
        self.fill_circle(cx, cy, r, fill);
        self.polyline(
            &[(cx - 4.5, cy + 0.5), (cx - 1.5, cy + 3.5), (cx + 4.5, cy - 3.5)],
            2.0,
            check,
        );
    }

    fn draw_reply_icon(&mut self, cx: f64, cy: f64, color: Rgba<u8>) {
        self.ring(cx, cy - 1.0, 7.5, 1.5, color);
        self.line((cx - 4.0, cy + 5.0), (cx - 7.0, cy + 8.5), 1.5, color);
    }

    fn draw_retweet_icon(&mut self, cx: f64, cy: f64, color: Rgba<u8>) {
        let t = 1.5;
        self.polyline(&[(cx - 6.0, cy - 4.0), (cx + 6.0, cy - 4.0), (cx + 6.0, cy + 2.0)], t, color);
        self.polyline(&[(cx + 3.0, cy - 1.0), (cx + 6.0, cy + 2.0), (cx + 9.0, cy - 1.0)], t, color);
        self.polyline(&[(cx + 6.0, cy + 4.0), (cx - 6.0, cy + 4.0), (cx - 6.0, cy - 2.0)], t, color);
        self.polyline(&[(cx - 9.0, cy + 1.0), (cx - 6.0, cy - 2.0), (cx - 3.0, cy + 1.0)], t, color);
    }

    fn draw_like_icon(&mut self, cx: f64, cy: f64, color: Rgba<u8>, bg: Rgba<u8>) {
        self.fill_heart(cx, cy, 1.0, color);
        self.fill_heart(cx, cy - 0.3, 0.72, bg);
    }

    fn fill_heart(&mut self, cx: f64, cy: f64, k: f64, color: Rgba<u8>) {
        let r = 4.6 * k;
        let top = cy - 2.5 * k;
        self.fill_circle(cx - 4.0 * k, top, r, color);
        self.fill_circle(cx + 4.0 * k, top, r, color);
        self.fill_triangle(
            (cx - 8.4 * k, top + 1.5 * k),
            (cx + 8.4 * k, top + 1.5 * k),
            (cx, cy + 8.0 * k),
            color,
        );
    }

    fn draw_share_icon(&mut self, cx: f64, cy: f64, color: Rgba<u8>) {
        let t = 1.5;
        self.line((cx, cy + 3.0), (cx, cy - 7.0), t, color);
        self.polyline(&[(cx - 4.0, cy - 3.0), (cx, cy - 7.0), (cx + 4.0, cy - 3.0)], t, color);
        self.polyline(
            &[(cx - 7.0, cy + 1.0), (cx - 7.0, cy + 7.0), (cx + 7.0, cy + 7.0), (cx + 7.0, cy + 1.0)],
            t,
            color,
        );
    }
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = src[3] as u32;
    let mix = |d: u8, s: u8| ((s as u32 * a + d as u32 * (255 - a)) / 255) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), 255])
}
