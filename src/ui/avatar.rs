use crate::avatar::AvatarRef;
use crate::error::AvatarError;
use image::imageops::FilterType;
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// A downsampled avatar drawn with half-block characters: each terminal
/// cell shows two pixels, top as foreground and bottom as background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarPixels {
    pixels: Vec<Vec<Color>>,
    size: u32,
}

impl AvatarPixels {
    /// Samples `size` x `size` pixels: `size` cells wide and `size / 2`
    /// lines tall, which looks square in a terminal.
    pub fn from_avatar(avatar: &AvatarRef, size: u32) -> Result<Self, AvatarError> {
        let img = avatar.decode()?;
        let side = size.max(1);
        let rgb = img
            .resize_to_fill(side, side, FilterType::Nearest)
            .to_rgb8();

        let pixels = (0..rgb.height())
            .map(|y| {
                (0..rgb.width())
                    .map(|x| {
                        let p = rgb.get_pixel(x, y);
                        Color::Rgb(p[0], p[1], p[2])
                    })
                    .collect()
            })
            .collect();

        Ok(Self { pixels, size: side })
    }

    pub fn width(&self) -> u16 {
        self.size as u16
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        self.pixels
            .chunks(2)
            .map(|pair| {
                let spans: Vec<Span<'static>> = (0..pair[0].len())
                    .map(|x| {
                        let top = pair[0][x];
                        let bottom = pair.get(1).map(|row| row[x]).unwrap_or(Color::Reset);
                        Span::styled("▀", Style::default().fg(top).bg(bottom))
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}
