//! Raster sink: paints a `Drawing` into an RGBA buffer and encodes it as PNG
//! or JPEG.
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::config::{EncodingConfiguration, OutputFormat, Rgba};
use crate::error::{BarcodeError, Result};
use crate::layout::{Drawing, Rect};
use crate::text;

fn pixel(color: Rgba) -> image::Rgba<u8> {
    image::Rgba(color.0)
}

/// Pixel span [start, end) covered by a rectangle edge pair, clamped to `limit`.
fn span(from: f64, len: f64, limit: u32) -> (u32, u32) {
    let start = from.round().max(0.0).min(limit as f64) as u32;
    let end = (from + len).round().max(0.0).min(limit as f64) as u32;
    (start, end.max(start))
}

fn fill_rect(img: &mut RgbaImage, rect: &Rect, color: image::Rgba<u8>) {
    let (width, height) = img.dimensions();
    let (x0, x1) = span(rect.x, rect.w, width);
    let (y0, y1) = span(rect.y, rect.h, height);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Background first, then the dark rectangles and the text.
pub fn rasterize(drawing: &Drawing, config: &EncodingConfiguration) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(drawing.width, drawing.height, pixel(config.background));
    let foreground = pixel(config.foreground);
    for rect in &drawing.rects {
        fill_rect(&mut img, rect, foreground);
    }
    for text_box in &drawing.texts {
        text::draw_text(&mut img, text_box, foreground);
    }
    img
}

/// Encodes the image; JPEG has no alpha channel and gets the RGB part only.
pub fn encode_image(img: RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?,
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
            rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?
        }
        OutputFormat::Svg => {
            return Err(BarcodeError::ImageEncoding("svg is not a raster format".into()));
        }
    }
    Ok(buf)
}
