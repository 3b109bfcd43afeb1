/// The encoder output handed to the layout stage. Carries modules only,
/// no pixels or colours.
use crate::config::EncodingConfiguration;
use crate::error::Result;

/// One bar or space of a linear symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bar {
    pub modules: u32,
    pub dark: bool,
    /// Guard bars of JAN/UPC reach down into the text row when extended guards are on.
    pub guard: bool,
}

impl Bar {
    pub fn new(modules: u32, dark: bool) -> Bar {
        Bar { modules, dark, guard: false }
    }
}

/// One row of a (possibly stacked) linear symbol. `height` is relative to the
/// other rows of the same symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarRow {
    pub bars: Vec<Bar>,
    pub height: u32,
}

impl BarRow {
    pub fn width(&self) -> u32 {
        self.bars.iter().map(|b| b.modules).sum()
    }
}

/// Human readable text anchored to a module range of the symbol (quiet zone included,
/// so x = 0 is the left edge of the left quiet zone).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearSymbol {
    pub rows: Vec<BarRow>,
    pub quiet_left: u32,
    pub quiet_right: u32,
    pub text: Vec<TextSegment>,
}

impl LinearSymbol {
    pub fn single_row(bars: Vec<Bar>, quiet: u32) -> LinearSymbol {
        LinearSymbol {
            rows: vec![BarRow { bars, height: 1 }],
            quiet_left: quiet,
            quiet_right: quiet,
            text: Vec::new(),
        }
    }

    /// Width of the widest row without quiet zones.
    pub fn symbol_width(&self) -> u32 {
        self.rows.iter().map(BarRow::width).max().unwrap_or(0)
    }

    /// Total module count including quiet zones.
    pub fn total_width(&self) -> u32 {
        self.quiet_left + self.symbol_width() + self.quiet_right
    }

    /// Places one text segment under the whole bar area.
    pub fn with_caption(mut self, caption: impl Into<String>) -> LinearSymbol {
        let start = self.quiet_left;
        let end = start + self.symbol_width();
        self.text = vec![TextSegment { text: caption.into(), start, end }];
        self
    }

    /// Dark/light modules of one row as booleans, for tests and checks.
    pub fn row_modules(&self, row: usize) -> Vec<bool> {
        self.rows
            .get(row)
            .map(|r| {
                r.bars
                    .iter()
                    .flat_map(|b| std::iter::repeat(b.dark).take(b.modules as usize))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A 2D module grid in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleGrid {
    pub width: u32,
    pub height: u32,
    cells: Vec<bool>,
}

impl ModuleGrid {
    pub fn new(width: u32, height: u32) -> ModuleGrid {
        ModuleGrid { width, height, cells: vec![false; (width * height) as usize] }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, dark: bool) {
        self.cells[(y * self.width + x) as usize] = dark;
    }

    pub fn count_dark(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixSymbol {
    pub grid: ModuleGrid,
    /// Quiet zone in modules on every side.
    pub quiet: u32,
    /// Height of one grid row in modules (PDF417 rows are taller than wide).
    pub row_height: u32,
}

/// The four bar shapes of the Japan Post customer barcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostalBar {
    Long,
    Ascender,
    Descender,
    Timing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostalSymbol {
    pub bars: Vec<PostalBar>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbstractSymbol {
    Linear(LinearSymbol),
    Matrix(MatrixSymbol),
    Postal(PostalSymbol),
}

/// Turns a payload into modules. One implementation per symbology.
pub trait Encoder: Send + Sync {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol>;
}

/// Converts a run-length list starting with a dark element into bars.
pub fn bars_from_widths(widths: &[u32], first_dark: bool) -> Vec<Bar> {
    widths
        .iter()
        .enumerate()
        .map(|(i, &w)| Bar::new(w, (i % 2 == 0) == first_dark))
        .collect()
}

/// Merges neighbouring bars of the same colour.
pub fn normalize(bars: Vec<Bar>) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars.into_iter().filter(|b| b.modules > 0) {
        match out.last_mut() {
            Some(last) if last.dark == bar.dark && last.guard == bar.guard => {
                last.modules += bar.modules
            }
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_merges_runs() {
        let bars = vec![Bar::new(1, true), Bar::new(2, true), Bar::new(0, false), Bar::new(1, false)];
        assert_eq!(normalize(bars), vec![Bar::new(3, true), Bar::new(1, false)]);
    }

    #[test]
    fn test_row_modules() {
        let sym = LinearSymbol::single_row(bars_from_widths(&[2, 1, 1], true), 3);
        assert_eq!(sym.row_modules(0), vec![true, true, false, true]);
        assert_eq!(sym.total_width(), 10);
    }
}
