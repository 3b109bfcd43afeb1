//! SVG sink: the same `Drawing` as the raster output, as markup.
use std::fmt::Write;

use crate::config::{EncodingConfiguration, Rgba};
use crate::layout::Drawing;
use crate::text;

fn fill(color: Rgba) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        format!("fill=\"#{:02X}{:02X}{:02X}\"", r, g, b)
    } else {
        format!("fill=\"#{:02X}{:02X}{:02X}\" fill-opacity=\"{:.3}\"", r, g, b, a as f64 / 255.0)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

/// Formats a coordinate without a trailing ".0" for whole pixels.
fn num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

pub fn to_svg(drawing: &Drawing, config: &EncodingConfiguration) -> String {
    let mut out = String::new();
    out += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    // writing into a String cannot fail
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{1}\" \
         viewBox=\"0 0 {0} {1}\">",
        drawing.width, drawing.height
    );
    let _ = writeln!(out, "\t<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" {}/>", fill(config.background));

    let foreground = fill(config.foreground);
    for rect in &drawing.rects {
        let _ = writeln!(
            out,
            "\t<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
            num(rect.x),
            num(rect.y),
            num(rect.w),
            num(rect.h),
            foreground
        );
    }
    for text_box in &drawing.texts {
        let (cells, advance) = text::char_cells(text_box);
        if cells.is_empty() {
            continue;
        }
        let baseline = text_box.y + text_box.h * 0.8;
        if text_box.even_spacing {
            // one anchored element per character keeps the spacing exact
            for (c, left) in text_box.text.chars().zip(cells) {
                let _ = writeln!(
                    out,
                    "\t<text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"{}\" \
                     text-anchor=\"middle\" {}>{}</text>",
                    num(left + advance / 2.0),
                    num(baseline),
                    num(text_box.h),
                    foreground,
                    escape(&c.to_string())
                );
            }
        } else {
            let _ = writeln!(
                out,
                "\t<text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"{}\" \
                 text-anchor=\"middle\" {}>{}</text>",
                num(text_box.x + text_box.w / 2.0),
                num(baseline),
                num(text_box.h),
                foreground,
                escape(&text_box.text)
            );
        }
    }
    out += "</svg>\n";
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Rect, TextBox};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_svg_document() {
        let drawing = Drawing {
            width: 20,
            height: 10,
            rects: vec![Rect { x: 2.0, y: 0.0, w: 1.5, h: 10.0 }],
            texts: vec![TextBox { text: "A<B".into(), x: 0.0, y: 0.0, w: 20.0, h: 10.0, even_spacing: false }],
        };
        let svg = to_svg(&drawing, &EncodingConfiguration::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"0 0 20 10\""));
        assert!(svg.contains("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>"));
        assert!(svg.contains("<rect x=\"2\" y=\"0\" width=\"1.5\" height=\"10\" fill=\"#000000\"/>"));
        assert!(svg.contains(">A&lt;B</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_fill_opacity() {
        assert_eq!(fill(Rgba([255, 0, 16, 255])), "fill=\"#FF0010\"");
        assert_eq!(fill(Rgba([0, 0, 0, 0])), "fill=\"#000000\" fill-opacity=\"0.000\"");
    }
}
