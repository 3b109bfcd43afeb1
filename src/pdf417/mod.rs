//! PDF417: compaction into codewords, GF(929) error correction, row layout and
//! the three codeword clusters. Every row is start pattern, left row indicator,
//! data columns, right row indicator and stop pattern.
use log::debug;

use crate::config::{EncodingConfiguration, StringEncoding};
use crate::error::{geometry, invalid, too_large, Result};
use crate::rscoding::{pdf417_ecc, pdf417_ecc_count};
use crate::symbol::{AbstractSymbol, Encoder, MatrixSymbol, ModuleGrid};

pub mod compaction;
mod patterns;

/// Quiet zone around a PDF417 symbol, in modules.
pub const QUIET_ZONE: u32 = 2;

const MAX_CODEWORDS: usize = 928;
const MAX_COLUMNS: u32 = 30;
const MIN_ROWS: u32 = 3;
const MAX_ROWS: u32 = 90;
const PAD: u16 = 900;

const START: (u32, u32) = (0b1111_1111_0101_0100_0, 17);
const STOP: (u32, u32) = (0b1111_1110_1000_1010_01, 18);

/// ECI designator codeword and the UTF-8 assignment.
const ECI: u16 = 927;
const ECI_UTF8: u16 = 26;

/// Bar pattern of codeword `cw` in the cluster used by row `row`.
fn codeword_pattern(row: u32, cw: u16) -> (u32, u32) {
    (1 << 16 | patterns::PATTERNS[(row % 3) as usize][cw as usize] as u32, 17)
}

/// Recommended error correction level for `data_len` data codewords.
fn auto_level(data_len: usize) -> u8 {
    match data_len {
        0..=40 => 2,
        41..=160 => 3,
        161..=320 => 4,
        _ => 5,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    columns: u32,
    rows: u32,
}

fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// Picks the column count whose symbol comes closest to the requested
/// height / width ratio.
fn auto_layout(total: u32, aspect_ratio: f64, y_height: u32) -> Option<Layout> {
    let mut best: Option<(f64, Layout)> = None;
    for columns in 1..=MAX_COLUMNS {
        let rows = div_ceil(total, columns).max(MIN_ROWS);
        if rows > MAX_ROWS {
            continue;
        }
        let ratio = (rows * y_height) as f64 / (17 * columns + 69) as f64;
        let distance = (ratio - aspect_ratio).abs();
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, Layout { columns, rows }));
        }
    }
    best.map(|(_, layout)| layout)
}

fn choose_layout(total: usize, config: &EncodingConfiguration) -> Result<Layout> {
    if config.columns > MAX_COLUMNS {
        return geometry(format!("PDF417 allows 1 to {} columns, got {}", MAX_COLUMNS, config.columns));
    }
    if config.rows != 0 && !(MIN_ROWS..=MAX_ROWS).contains(&config.rows) {
        return geometry(format!("PDF417 allows {} to {} rows, got {}", MIN_ROWS, MAX_ROWS, config.rows));
    }
    let total = total as u32;
    let layout = match (config.columns, config.rows) {
        (0, 0) => match auto_layout(total, config.aspect_ratio, config.y_height.max(1)) {
            Some(layout) => layout,
            None => return too_large(format!("{} PDF417 codewords fit no layout", total)),
        },
        (columns, 0) => Layout { columns, rows: div_ceil(total, columns).max(MIN_ROWS) },
        (0, rows) => Layout { columns: div_ceil(total, rows), rows },
        (columns, rows) => Layout { columns, rows },
    };
    if layout.columns > MAX_COLUMNS || layout.rows > MAX_ROWS || layout.columns * layout.rows < total {
        return too_large(format!(
            "{} PDF417 codewords do not fit {} columns x {} rows",
            total, layout.columns, layout.rows
        ));
    }
    Ok(layout)
}

/// Left and right row indicator codewords of `row`.
fn row_indicators(row: u32, rows: u32, columns: u32, level: u8) -> (u16, u16) {
    let base = 30 * (row / 3);
    let r = (rows - 1) / 3;
    let c = columns - 1;
    let l = 3 * level as u32 + (rows - 1) % 3;
    let (left, right) = match row % 3 {
        0 => (base + r, base + c),
        1 => (base + l, base + r),
        _ => (base + c, base + l),
    };
    (left as u16, right as u16)
}

fn push_pattern(grid: &mut ModuleGrid, x: &mut u32, y: u32, (pattern, len): (u32, u32)) {
    for i in (0..len).rev() {
        grid.set(*x, y, (pattern >> i) & 1 == 1);
        *x += 1;
    }
}

pub fn encode_pdf417(payload: &str, config: &EncodingConfiguration) -> Result<MatrixSymbol> {
    if payload.is_empty() {
        return invalid("PDF417 payload is empty");
    }
    let bytes = config.string_encoding.encode(payload)?;
    let mut data = Vec::new();
    if config.string_encoding == StringEncoding::Utf8 && !payload.is_ascii() {
        data.extend_from_slice(&[ECI, ECI_UTF8]);
    }
    data.extend(compaction::compact(&bytes));

    // the length descriptor counts as data
    let data_len = data.len() + 1;
    let level = match config.error_level {
        Some(level) => level.min(8),
        None => auto_level(data_len),
    };
    let ecc_len = pdf417_ecc_count(level);
    if data_len + ecc_len > MAX_CODEWORDS {
        return too_large(format!("{} PDF417 data codewords at level {}", data_len, level));
    }
    let layout = choose_layout(data_len + ecc_len, config)?;
    debug!(
        "PDF417 {} columns x {} rows, level {}, {} data codewords",
        layout.columns, layout.rows, level, data_len
    );

    let capacity = (layout.columns * layout.rows) as usize;
    let mut codewords = Vec::with_capacity(capacity);
    codewords.push((capacity - ecc_len) as u16);
    codewords.extend(data);
    codewords.resize(capacity - ecc_len, PAD);
    let ecc = pdf417_ecc(&codewords, level);
    codewords.extend(ecc);

    let width = 17 * layout.columns + 69;
    let mut grid = ModuleGrid::new(width, layout.rows);
    for (y, row) in codewords.chunks(layout.columns as usize).enumerate() {
        let y = y as u32;
        let (left, right) = row_indicators(y, layout.rows, layout.columns, level);
        let mut x = 0;
        push_pattern(&mut grid, &mut x, y, START);
        push_pattern(&mut grid, &mut x, y, codeword_pattern(y, left));
        for &cw in row {
            push_pattern(&mut grid, &mut x, y, codeword_pattern(y, cw));
        }
        push_pattern(&mut grid, &mut x, y, codeword_pattern(y, right));
        push_pattern(&mut grid, &mut x, y, STOP);
    }

    Ok(MatrixSymbol { grid, quiet: QUIET_ZONE, row_height: config.y_height.max(1) })
}

pub struct Pdf417Encoder;

impl Encoder for Pdf417Encoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        encode_pdf417(payload, config).map(AbstractSymbol::Matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BarcodeError;
    use pretty_assertions::assert_eq;

    fn row_bits(grid: &ModuleGrid, y: u32, from: u32, len: u32) -> u32 {
        (from..from + len).fold(0, |acc, x| acc << 1 | grid.get(x, y) as u32)
    }

    /// Bar and space widths of a 17 module pattern.
    fn widths(pattern: u32) -> Vec<u32> {
        let mut widths: Vec<u32> = Vec::new();
        let mut last = None;
        for i in (0..17).rev() {
            let bit = (pattern >> i) & 1;
            if last == Some(bit) {
                if let Some(w) = widths.last_mut() {
                    *w += 1;
                }
            } else {
                widths.push(1);
                last = Some(bit);
            }
        }
        widths
    }

    #[test]
    fn test_codeword_patterns() {
        // published values: codeword 0 of clusters 0, 3 and 6
        assert_eq!(widths(codeword_pattern(0, 0).0), vec![3, 1, 1, 1, 1, 1, 3, 6]);
        assert_eq!(widths(codeword_pattern(1, 0).0), vec![5, 1, 1, 1, 1, 1, 2, 5]);
        assert_eq!(widths(codeword_pattern(2, 0).0), vec![2, 1, 1, 1, 1, 1, 5, 5]);
        assert_eq!(codeword_pattern(0, 0).0, 0b11101010111000000);

        for row in 0..3u32 {
            for cw in 0..929u16 {
                let w = widths(codeword_pattern(row, cw).0);
                assert_eq!(w.len(), 8);
                assert_eq!(w.iter().sum::<u32>(), 17);
                // the cluster number selects the row
                let k = (w[0] + w[4] + 18 - w[2] - w[6]) % 9;
                assert_eq!(k, 3 * row, "codeword {} of row {}", cw, row);
            }
        }
    }

    #[test]
    fn test_row_indicators() {
        assert_eq!(row_indicators(0, 10, 4, 2), (3, 3));
        assert_eq!(row_indicators(1, 10, 4, 2), (6, 3));
        assert_eq!(row_indicators(2, 10, 4, 2), (3, 6));
        assert_eq!(row_indicators(3, 10, 4, 2), (33, 33));
    }

    #[test]
    fn test_auto_layout() {
        assert_eq!(auto_layout(13, 0.5, 3), Some(Layout { columns: 1, rows: 13 }));
        assert_eq!(auto_layout(100, 0.5, 3), Some(Layout { columns: 4, rows: 25 }));
        assert_eq!(auto_layout(300, 0.5, 3), Some(Layout { columns: 9, rows: 34 }));
    }

    #[test]
    fn test_encode_rows() {
        let symbol = encode_pdf417("PDF417", &EncodingConfiguration::default()).unwrap();
        let g = &symbol.grid;
        assert_eq!((g.width, g.height), (86, 13));
        assert_eq!(symbol.row_height, 3);
        for y in 0..13 {
            assert_eq!(row_bits(g, y, 0, 17), START.0);
            assert_eq!(row_bits(g, y, 68, 18), STOP.0);
        }
        // left row indicator of row 0: (13 - 1) / 3
        assert_eq!(row_bits(g, 0, 17, 17), codeword_pattern(0, 4).0);
        // the length descriptor opens the data: 13 codewords minus 8 ecc
        assert_eq!(row_bits(g, 0, 34, 17), codeword_pattern(0, 5).0);
        assert_eq!(row_bits(g, 1, 34, 17), codeword_pattern(1, 453).0);
    }

    #[test]
    fn test_utf8_eci() {
        let symbol = encode_pdf417("\u{e9}", &EncodingConfiguration::default()).unwrap();
        let g = &symbol.grid;
        // one data column: length descriptor, ECI 927 26, byte latch, two bytes
        assert_eq!(g.width, 86);
        assert_eq!(row_bits(g, 1, 34, 17), codeword_pattern(1, ECI).0);
        assert_eq!(row_bits(g, 2, 34, 17), codeword_pattern(2, ECI_UTF8).0);
        assert_eq!(row_bits(g, 3, 34, 17), codeword_pattern(3, compaction::LATCH_BYTE).0);

        let symbol = encode_pdf417("plain", &EncodingConfiguration::default()).unwrap();
        assert_ne!(row_bits(&symbol.grid, 1, 34, 17), codeword_pattern(1, ECI).0);
    }

    #[test]
    fn test_fixed_layout() {
        let config = EncodingConfiguration { columns: 2, error_level: Some(0), ..Default::default() };
        let symbol = encode_pdf417("PDF417", &config).unwrap();
        assert_eq!((symbol.grid.width, symbol.grid.height), (103, 4));

        let config = EncodingConfiguration { columns: 4, rows: 10, ..Default::default() };
        assert!(matches!(encode_pdf417(&"A".repeat(100), &config), Err(BarcodeError::PayloadTooLarge(_))));
        assert!(encode_pdf417(&"A".repeat(30), &config).is_ok());
    }
}
