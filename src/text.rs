//! Human readable text for raster output, drawn from the Spleen 12x24 bitmap
//! font scaled to the text box height.
use std::collections::HashMap;

use image::RgbaImage;
use lazy_static::lazy_static;
use spleen_font::{PSF2Font, FONT_12X24};

use crate::layout::TextBox;

pub const GLYPH_WIDTH: usize = 12;
pub const GLYPH_HEIGHT: usize = 24;

type Glyph = [[bool; GLYPH_WIDTH]; GLYPH_HEIGHT];

lazy_static! {
    /// Printable ASCII glyphs, looked up once.
    static ref GLYPHS: HashMap<char, Glyph> = {
        let mut glyphs = HashMap::new();
        if let Ok(mut font) = PSF2Font::new(FONT_12X24) {
            for c in (0x20u8..0x7F).map(char::from) {
                let utf8 = c.to_string();
                if let Some(rows) = font.glyph_for_utf8(utf8.as_bytes()) {
                    let mut glyph = [[false; GLYPH_WIDTH]; GLYPH_HEIGHT];
                    for (y, row) in rows.enumerate().take(GLYPH_HEIGHT) {
                        for (x, on) in row.enumerate().take(GLYPH_WIDTH) {
                            glyph[y][x] = on;
                        }
                    }
                    glyphs.insert(c, glyph);
                }
            }
        }
        glyphs
    };
}

/// Left edges of the character cells of `text` inside `bx`, with the cell
/// width. Characters are as wide as half the box height.
pub fn char_cells(bx: &TextBox) -> (Vec<f64>, f64) {
    let n = bx.text.chars().count();
    if n == 0 {
        return (Vec::new(), 0.0);
    }
    let advance = bx.h / 2.0;
    if bx.even_spacing {
        let pitch = bx.w / n as f64;
        let left = bx.x + (pitch - advance) / 2.0;
        ((0..n).map(|i| left + i as f64 * pitch).collect(), advance)
    } else {
        let left = bx.x + (bx.w - advance * n as f64) / 2.0;
        ((0..n).map(|i| left + i as f64 * advance).collect(), advance)
    }
}

/// Paints the text of `bx` onto the image with nearest neighbour glyph scaling.
/// Pixels outside the image are skipped.
pub fn draw_text(img: &mut RgbaImage, bx: &TextBox, color: image::Rgba<u8>) {
    let (cells, advance) = char_cells(bx);
    let (width, height) = img.dimensions();
    let cell_w = advance.round().max(1.0) as i64;
    let cell_h = bx.h.round().max(1.0) as i64;
    let top = bx.y.round() as i64;

    for (c, left) in bx.text.chars().zip(cells) {
        let glyph = match GLYPHS.get(&c) {
            Some(glyph) => glyph,
            None => continue,
        };
        let left = left.round() as i64;
        for py in 0..cell_h {
            let gy = (py as usize * GLYPH_HEIGHT) / cell_h as usize;
            for px in 0..cell_w {
                let gx = (px as usize * GLYPH_WIDTH) / cell_w as usize;
                if !glyph[gy][gx] {
                    continue;
                }
                let (x, y) = (left + px, top + py);
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}
