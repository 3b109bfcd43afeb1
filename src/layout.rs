//! Maps module based symbols onto a pixel canvas. The result is a `Drawing`:
//! dark rectangles and text boxes in pixel coordinates, shared by the raster
//! and the vector sinks so both render the same geometry.
use log::debug;

use crate::config::EncodingConfiguration;
use crate::error::{geometry, Result};
use crate::symbol::{LinearSymbol, MatrixSymbol, PostalBar, PostalSymbol};

/// Postal bar geometry in units: a bar is one unit wide, followed by a one unit gap.
const POSTAL_UNITS_HIGH: u32 = 6;
const POSTAL_QUIET_UNITS: u32 = 2;

/// Smallest text height in pixels.
const MIN_TEXT_HEIGHT: u32 = 6;

/// Largest canvas side in pixels, the JPEG limit.
const MAX_CANVAS_SIDE: u32 = 65_535;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Human readable text inside a pixel box. Characters are centred in the box,
/// or spread over it with `even_spacing`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub even_spacing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Drawing {
    pub width: u32,
    pub height: u32,
    pub rects: Vec<Rect>,
    pub texts: Vec<TextBox>,
}

impl Drawing {
    fn new(width: u32, height: u32) -> Result<Drawing> {
        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return geometry(format!("canvas {}x{} exceeds {} px per side", width, height, MAX_CANVAS_SIDE));
        }
        Ok(Drawing { width, height, rects: Vec::new(), texts: Vec::new() })
    }
}

/// Height of the text line and of the gap above it, in pixels.
pub fn text_metrics(height: u32, config: &EncodingConfiguration) -> Result<(u32, u32)> {
    let text_h = (config.text_font_scale * height as f64 * 0.25).round().max(MIN_TEXT_HEIGHT as f64);
    let gap = (config.text_gap * text_h * 0.25).round().max(0.0);
    if !(text_h + gap).is_finite() || text_h + gap > MAX_CANVAS_SIDE as f64 {
        return geometry(format!("text of {} px and gap of {} px do not fit a canvas", text_h, gap));
    }
    Ok((text_h as u32, gap as u32))
}

/// Lays out a (possibly stacked) linear symbol into `width` x `height` pixels of
/// bars; text, when shown, extends the canvas below the bars.
pub fn layout_linear(
    symbol: &LinearSymbol,
    width: u32,
    height: u32,
    config: &EncodingConfiguration,
) -> Result<Drawing> {
    let modules = symbol.total_width();
    if modules == 0 || width < modules {
        return geometry(format!("width {} is below the {} modules of the symbol", width, modules));
    }
    if height == 0 {
        return geometry("height must be positive");
    }

    let (module_w, origin) = if config.fit_width {
        (width as f64 / modules as f64, 0.0)
    } else {
        let m = width / modules;
        (m as f64, ((width - m * modules) / 2) as f64)
    };

    let show_text = config.show_text && symbol.text.iter().any(|t| !t.text.is_empty());
    let (text_h, gap) = if show_text { text_metrics(height, config)? } else { (0, 0) };
    let canvas_h = match height.checked_add(gap + text_h) {
        Some(h) => h,
        None => return geometry(format!("height {} with text overflows", height)),
    };
    let mut drawing = Drawing::new(width, canvas_h)?;

    let black = config.px_adjust_black as f64;
    let white = config.px_adjust_white as f64;
    let total_rows: u32 = symbol.rows.iter().map(|r| r.height).sum::<u32>().max(1);
    let mut weight = 0;
    for row in &symbol.rows {
        let y0 = (height as f64 * weight as f64 / total_rows as f64).round();
        weight += row.height;
        let y1 = (height as f64 * weight as f64 / total_rows as f64).round();

        // adjusted bars stay centred on the nominal row
        let adjust: f64 = row.bars.iter().map(|b| if b.dark { black } else { white }).sum();
        let mut x = origin + symbol.quiet_left as f64 * module_w - adjust / 2.0;
        for bar in &row.bars {
            let nominal = bar.modules as f64 * module_w;
            let w = if bar.dark { nominal + black } else { nominal + white };
            if w <= 0.0 {
                return geometry(format!(
                    "pixel adjustment leaves a {} bar of {} px",
                    if bar.dark { "dark" } else { "light" },
                    w
                ));
            }
            if bar.dark {
                let extension = if bar.guard && show_text { (text_h / 2) as f64 } else { 0.0 };
                drawing.rects.push(Rect { x, y: y0, w, h: y1 - y0 + extension });
            }
            x += w;
        }
    }

    if show_text {
        for segment in symbol.text.iter().filter(|t| !t.text.is_empty()) {
            drawing.texts.push(TextBox {
                text: segment.text.clone(),
                x: origin + segment.start as f64 * module_w,
                y: (height + gap) as f64,
                w: (segment.end - segment.start) as f64 * module_w,
                h: text_h as f64,
                even_spacing: config.text_even_spacing,
            });
        }
    }
    debug!("linear layout: {} modules at {:.2} px, {} rects", modules, module_w, drawing.rects.len());
    Ok(drawing)
}

/// Lays out a 2D symbol into exactly `width` x `height` pixels.
pub fn layout_matrix(
    symbol: &MatrixSymbol,
    width: u32,
    height: u32,
    config: &EncodingConfiguration,
) -> Result<Drawing> {
    let grid = &symbol.grid;
    let row_height = symbol.row_height.max(1);
    let cols = grid.width + 2 * symbol.quiet;
    let rows = grid.height * row_height + 2 * symbol.quiet;

    let (module_w, module_h, x0, y0) = if config.fit_width {
        if width < cols || height < rows {
            return geometry(format!("{}x{} px cannot hold {}x{} modules", width, height, cols, rows));
        }
        (width as f64 / cols as f64, height as f64 / rows as f64, 0.0, 0.0)
    } else {
        let m = (width / cols).min(height / rows);
        if m == 0 {
            return geometry(format!("{}x{} px cannot hold {}x{} modules", width, height, cols, rows));
        }
        let x0 = ((width - m * cols) / 2) as f64;
        let y0 = ((height - m * rows) / 2) as f64;
        (m as f64, m as f64, x0, y0)
    };

    let mut drawing = Drawing::new(width, height)?;
    for y in 0..grid.height {
        let top = y0 + (symbol.quiet + y * row_height) as f64 * module_h;
        let mut x = 0;
        while x < grid.width {
            if !grid.get(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            while x < grid.width && grid.get(x, y) {
                x += 1;
            }
            drawing.rects.push(Rect {
                x: x0 + (symbol.quiet + start) as f64 * module_w,
                y: top,
                w: (x - start) as f64 * module_w,
                h: row_height as f64 * module_h,
            });
        }
    }
    debug!("matrix layout: {}x{} modules at {:.2} px", cols, rows, module_w);
    Ok(drawing)
}

/// Minimum canvas width of a postal symbol drawn `height` pixels high.
pub fn postal_width(symbol: &PostalSymbol, height: u32) -> u32 {
    let unit = height / POSTAL_UNITS_HIGH;
    (2 * symbol.bars.len() as u32 - 1 + 2 * POSTAL_QUIET_UNITS) * unit
}

/// Lays out the 4-state bars. Without an explicit width the canvas is exactly
/// as wide as the symbol and its quiet zones.
pub fn layout_postal(
    symbol: &PostalSymbol,
    width: Option<u32>,
    height: u32,
    config: &EncodingConfiguration,
) -> Result<Drawing> {
    let unit = height / POSTAL_UNITS_HIGH;
    if unit == 0 {
        return geometry(format!("height {} is below {} px", height, POSTAL_UNITS_HIGH));
    }
    let u = unit as f64;
    let bar_w = u + config.px_adjust_black as f64;
    let gap_w = u + config.px_adjust_white as f64;
    if bar_w <= 0.0 || gap_w <= 0.0 {
        return geometry(format!("pixel adjustment leaves postal bars of {} px and gaps of {} px", bar_w, gap_w));
    }
    // the adjusted bars keep their quiet zones, so the minimum follows the adjustment
    let n = symbol.bars.len() as f64;
    let adjust = n * (bar_w - u) + (n - 1.0).max(0.0) * (gap_w - u);
    let required = postal_width(symbol, height) as f64 + adjust;
    let minimum = required.ceil().max(1.0) as u32;
    let width = match width {
        Some(w) if w < minimum => {
            return geometry(format!("width {} is below the {} px of the symbol", w, minimum));
        }
        Some(w) => w,
        None => minimum,
    };

    let x0 = ((width as f64 - required) / 2.0).floor() + (POSTAL_QUIET_UNITS * unit) as f64;
    let y0 = ((height - POSTAL_UNITS_HIGH * unit) / 2) as f64;

    let mut drawing = Drawing::new(width, height)?;
    for (i, bar) in symbol.bars.iter().enumerate() {
        let (top, units) = match bar {
            PostalBar::Long => (0, 6),
            PostalBar::Ascender => (0, 4),
            PostalBar::Descender => (2, 4),
            PostalBar::Timing => (2, 2),
        };
        drawing.rects.push(Rect {
            x: x0 + i as f64 * (bar_w + gap_w),
            y: y0 + top as f64 * u,
            w: bar_w,
            h: units as f64 * u,
        });
    }
    Ok(drawing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BarcodeError;
    use crate::symbol::{bars_from_widths, ModuleGrid, TextSegment};
    use pretty_assertions::assert_eq;

    fn sample() -> LinearSymbol {
        LinearSymbol::single_row(bars_from_widths(&[1, 1, 2, 1, 1], true), 2).with_caption("AB")
    }

    #[test]
    fn test_linear_integer_modules() {
        let config = EncodingConfiguration { show_text: false, ..Default::default() };
        // 10 modules into 25 px: 2 px modules, 2 px left margin
        let drawing = layout_linear(&sample(), 25, 40, &config).unwrap();
        assert_eq!((drawing.width, drawing.height), (25, 40));
        assert_eq!(drawing.rects.len(), 3);
        assert_eq!(drawing.rects[0], Rect { x: 6.0, y: 0.0, w: 2.0, h: 40.0 });
        assert_eq!(drawing.rects[1], Rect { x: 10.0, y: 0.0, w: 4.0, h: 40.0 });
    }

    #[test]
    fn test_linear_fit_width() {
        let config = EncodingConfiguration { show_text: false, fit_width: true, ..Default::default() };
        let drawing = layout_linear(&sample(), 25, 40, &config).unwrap();
        assert_eq!(drawing.rects[0].x, 5.0);
        assert_eq!(drawing.rects[2].w, 2.5);
    }

    #[test]
    fn test_linear_text_grows_canvas() {
        let drawing = layout_linear(&sample(), 100, 100, &EncodingConfiguration::default()).unwrap();
        // text 25 px, gap round(6.25) = 6 px
        assert_eq!(drawing.height, 131);
        assert_eq!(drawing.texts[0].y, 106.0);
        assert_eq!(drawing.texts[0].text, "AB");
    }

    #[test]
    fn test_linear_geometry_errors() {
        let config = EncodingConfiguration::default();
        assert!(matches!(layout_linear(&sample(), 1, 1, &config), Err(BarcodeError::InvalidGeometry(_))));
        let config = EncodingConfiguration { px_adjust_black: -2, ..Default::default() };
        assert!(matches!(layout_linear(&sample(), 20, 10, &config), Err(BarcodeError::InvalidGeometry(_))));
        let config = EncodingConfiguration { px_adjust_black: 1, ..Default::default() };
        assert!(layout_linear(&sample(), 20, 10, &config).is_ok());
        let config = EncodingConfiguration { px_adjust_white: -2, ..Default::default() };
        assert!(matches!(layout_linear(&sample(), 20, 10, &config), Err(BarcodeError::InvalidGeometry(_))));
    }

    #[test]
    fn test_px_adjust_is_per_colour() {
        let xs = |drawing: &Drawing| drawing.rects.iter().map(|r| (r.x, r.w)).collect::<Vec<_>>();
        // nominal bars at 6, 10 and 16 px, 2 px modules
        let config = EncodingConfiguration { show_text: false, px_adjust_white: 2, ..Default::default() };
        let drawing = layout_linear(&sample(), 25, 40, &config).unwrap();
        assert_eq!(xs(&drawing), vec![(4.0, 2.0), (10.0, 4.0), (18.0, 2.0)]);

        let config = EncodingConfiguration { show_text: false, px_adjust_black: 1, ..Default::default() };
        let drawing = layout_linear(&sample(), 25, 40, &config).unwrap();
        assert_eq!(xs(&drawing), vec![(4.5, 3.0), (9.5, 5.0), (16.5, 3.0)]);
    }

    #[test]
    fn test_huge_text_scale() {
        let config = EncodingConfiguration { text_font_scale: 1e10, ..Default::default() };
        assert!(matches!(text_metrics(100, &config), Err(BarcodeError::InvalidGeometry(_))));
        assert!(matches!(layout_linear(&sample(), 100, 100, &config), Err(BarcodeError::InvalidGeometry(_))));
        let config = EncodingConfiguration { text_font_scale: 1.0, text_gap: 1.0, ..Default::default() };
        assert_eq!(text_metrics(100, &config), Ok((25, 6)));
    }

    #[test]
    fn test_guard_extension() {
        let mut symbol = sample();
        symbol.rows[0].bars[0].guard = true;
        symbol.text = vec![TextSegment { text: "1".into(), start: 4, end: 6 }];
        let drawing = layout_linear(&symbol, 10, 100, &EncodingConfiguration::default()).unwrap();
        assert_eq!(drawing.rects[0].h, 112.0);
        assert_eq!(drawing.rects[1].h, 100.0);
    }

    #[test]
    fn test_matrix_centred() {
        let mut grid = ModuleGrid::new(3, 3);
        grid.set(0, 0, true);
        grid.set(1, 0, true);
        let symbol = MatrixSymbol { grid, quiet: 1, row_height: 1 };
        // 5 modules into 23 px: 4 px modules, 1 px margin
        let drawing = layout_matrix(&symbol, 23, 23, &EncodingConfiguration::default()).unwrap();
        assert_eq!((drawing.width, drawing.height), (23, 23));
        assert_eq!(drawing.rects, vec![Rect { x: 5.0, y: 5.0, w: 8.0, h: 4.0 }]);
        assert!(layout_matrix(&symbol, 4, 4, &EncodingConfiguration::default()).is_err());
    }

    #[test]
    fn test_postal() {
        let symbol = PostalSymbol { bars: vec![PostalBar::Long; 67] };
        let config = EncodingConfiguration::default();
        let drawing = layout_postal(&symbol, None, 50, &config).unwrap();
        // unit 8 px, 133 units of bars and gaps plus 2 quiet units per side, 137 in all
        assert_eq!((drawing.width, drawing.height), (1096, 50));
        assert_eq!(drawing.rects[0], Rect { x: 16.0, y: 1.0, w: 8.0, h: 48.0 });
        assert!(layout_postal(&symbol, Some(1000), 50, &config).is_err());
        assert_eq!(layout_postal(&symbol, Some(1200), 50, &config).unwrap().rects[0].x, 68.0);
        assert!(layout_postal(&symbol, None, 5, &config).is_err());
    }

    #[test]
    fn test_postal_px_adjust() {
        let symbol = PostalSymbol { bars: vec![PostalBar::Long; 3] };
        // unit 8 px: nominal bars at 16, 32 and 48 px on a 72 px canvas
        let config = EncodingConfiguration { px_adjust_white: 2, ..Default::default() };
        let drawing = layout_postal(&symbol, None, 48, &config).unwrap();
        let xs: Vec<(f64, f64)> = drawing.rects.iter().map(|r| (r.x, r.w)).collect();
        assert_eq!(drawing.width, 76);
        assert_eq!(xs, vec![(16.0, 8.0), (34.0, 8.0), (52.0, 8.0)]);

        let config = EncodingConfiguration { px_adjust_black: 2, ..Default::default() };
        let drawing = layout_postal(&symbol, None, 48, &config).unwrap();
        let xs: Vec<(f64, f64)> = drawing.rects.iter().map(|r| (r.x, r.w)).collect();
        assert_eq!(drawing.width, 78);
        assert_eq!(xs, vec![(16.0, 10.0), (34.0, 10.0), (52.0, 10.0)]);
        assert!(layout_postal(&symbol, Some(77), 48, &config).is_err());
        // a wider canvas centres the adjusted bars
        assert_eq!(layout_postal(&symbol, Some(82), 48, &config).unwrap().rects[0].x, 18.0);

        let config = EncodingConfiguration { px_adjust_white: -8, ..Default::default() };
        assert!(matches!(layout_postal(&symbol, None, 48, &config), Err(BarcodeError::InvalidGeometry(_))));
    }
}
