//! Half-block rendering of the watermark layer.
//!
//! Each terminal cell shows two vertically stacked pixels: the top one as the
//! `▀` foreground, the bottom one as the background.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::Color;
use ratatui::widgets::{Block, Widget};

use super::theme::Theme;

pub struct PreviewWidget<'a> {
    layer: &'a RgbaImage,
    block: Option<Block<'a>>,
}

impl<'a> PreviewWidget<'a> {
    pub fn new(layer: &'a RgbaImage) -> Self {
        Self { layer, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        let flat = flatten(self.layer, Theme::PAPER);
        render_halfblocks(&flat, inner, buf);
    }
}

/// Composite a straight-alpha layer over an opaque backdrop.
pub fn flatten(layer: &RgbaImage, backdrop: [u8; 3]) -> RgbaImage {
    RgbaImage::from_fn(layer.width(), layer.height(), |x, y| {
        let px = layer.get_pixel(x, y);
        let a = u16::from(px[3]);
        let mix = |fg: u8, bg: u8| ((u16::from(fg) * a + u16::from(bg) * (255 - a) + 127) / 255) as u8;
        Rgba([
            mix(px[0], backdrop[0]),
            mix(px[1], backdrop[1]),
            mix(px[2], backdrop[2]),
            255,
        ])
    })
}

fn render_halfblocks(image: &RgbaImage, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 || image.width() == 0 || image.height() == 0 {
        return;
    }

    // Each column is 1 px wide, each row 2 px tall.  The layer's aspect is
    // deliberately not preserved: cells stand in for the layout pixels the
    // layer was measured from.
    let px_w = u32::from(area.width);
    let px_h = u32::from(area.height) * 2;
    let scaled = image::imageops::resize(image, px_w, px_h, FilterType::Triangle);

    for row in 0..area.height {
        let yt = u32::from(row) * 2;
        let yb = yt + 1;
        for col in 0..area.width {
            let t = scaled.get_pixel(u32::from(col), yt);
            let b = scaled.get_pixel(u32::from(col), yb);
            if let Some(cell) = buf.cell_mut(Position::new(area.x + col, area.y + row)) {
                cell.set_char('▀')
                    .set_fg(Color::Rgb(t[0], t[1], t[2]))
                    .set_bg(Color::Rgb(b[0], b[1], b[2]));
            }
        }
    }
}
