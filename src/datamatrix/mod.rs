//! DataMatrix ECC200: encodation into codewords, Reed-Solomon protection,
//! Utah placement into the mapping matrix and assembly of the data regions
//! with their finder and clock patterns.

use log::debug;

use crate::config::{DataMatrixSize, EncodingConfiguration, StringEncoding};
use crate::error::{too_large, Result};
use crate::rscoding::datamatrix_ecc;
use crate::symbol::{AbstractSymbol, Encoder, MatrixSymbol, ModuleGrid};

pub mod encodation;
pub mod placement;

/// Quiet zone around a DataMatrix symbol, in modules.
pub const QUIET_ZONE: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolSize {
    pub rows: u32,
    pub cols: u32,
    /// Data regions vertically and horizontally.
    pub regions: (u32, u32),
    pub data_codewords: usize,
    pub ecc_codewords: usize,
    pub blocks: usize,
}

const fn size(rows: u32, cols: u32, regions: (u32, u32), data: usize, ecc: usize, blocks: usize) -> SymbolSize {
    SymbolSize { rows, cols, regions, data_codewords: data, ecc_codewords: ecc, blocks }
}

/// All ECC200 sizes, squares first in ascending order, then the rectangles.
pub const SIZES: [SymbolSize; 30] = [
    size(10, 10, (1, 1), 3, 5, 1),
    size(12, 12, (1, 1), 5, 7, 1),
    size(14, 14, (1, 1), 8, 10, 1),
    size(16, 16, (1, 1), 12, 12, 1),
    size(18, 18, (1, 1), 18, 14, 1),
    size(20, 20, (1, 1), 22, 18, 1),
    size(22, 22, (1, 1), 30, 20, 1),
    size(24, 24, (1, 1), 36, 24, 1),
    size(26, 26, (1, 1), 44, 28, 1),
    size(32, 32, (2, 2), 62, 36, 1),
    size(36, 36, (2, 2), 86, 42, 1),
    size(40, 40, (2, 2), 114, 48, 1),
    size(44, 44, (2, 2), 144, 56, 1),
    size(48, 48, (2, 2), 174, 68, 1),
    size(52, 52, (2, 2), 204, 84, 2),
    size(64, 64, (4, 4), 280, 112, 2),
    size(72, 72, (4, 4), 368, 144, 4),
    size(80, 80, (4, 4), 456, 192, 4),
    size(88, 88, (4, 4), 576, 224, 4),
    size(96, 96, (4, 4), 696, 272, 4),
    size(104, 104, (4, 4), 816, 336, 6),
    size(120, 120, (6, 6), 1050, 408, 6),
    size(132, 132, (6, 6), 1304, 496, 8),
    size(144, 144, (6, 6), 1558, 620, 10),
    size(8, 18, (1, 1), 5, 7, 1),
    size(8, 32, (1, 2), 10, 11, 1),
    size(12, 26, (1, 1), 16, 14, 1),
    size(12, 36, (1, 2), 22, 18, 1),
    size(16, 36, (1, 2), 32, 24, 1),
    size(16, 48, (1, 2), 49, 28, 1),
];

impl SymbolSize {
    pub fn lookup(rows: u32, cols: u32) -> Option<&'static SymbolSize> {
        SIZES.iter().find(|s| s.rows == rows && s.cols == cols)
    }

    /// Smallest square size holding `data_len` codewords.
    pub fn smallest_square(data_len: usize) -> Option<&'static SymbolSize> {
        SIZES.iter().filter(|s| s.rows == s.cols).find(|s| s.data_codewords >= data_len)
    }

    pub fn region_rows(&self) -> u32 {
        self.rows / self.regions.0 - 2
    }

    pub fn region_cols(&self) -> u32 {
        self.cols / self.regions.1 - 2
    }

    /// Rows and columns of the mapping matrix, all data regions joined.
    pub fn mapping_size(&self) -> (u32, u32) {
        (self.region_rows() * self.regions.0, self.region_cols() * self.regions.1)
    }
}

/// Fills the unused data capacity: 129 first, then pseudo random pads.
fn pad_codewords(codewords: &mut Vec<u8>, capacity: usize) {
    if codewords.len() < capacity {
        codewords.push(129);
    }
    while codewords.len() < capacity {
        let position = codewords.len() + 1;
        let mut pad = 129 + ((149 * position) % 253) + 1;
        if pad > 254 {
            pad -= 254;
        }
        codewords.push(pad as u8);
    }
}

/// Draws finder and clock patterns around every data region and copies the
/// mapping matrix into the regions.
fn assemble(size: &SymbolSize, mapping: &ModuleGrid) -> ModuleGrid {
    let mut grid = ModuleGrid::new(size.cols, size.rows);
    let (rr, rc) = (size.region_rows(), size.region_cols());
    for rv in 0..size.regions.0 {
        for rh in 0..size.regions.1 {
            let (y0, x0) = (rv * (rr + 2), rh * (rc + 2));
            for dy in 0..rr + 2 {
                // solid left edge, alternating right edge
                grid.set(x0, y0 + dy, true);
                grid.set(x0 + rc + 1, y0 + dy, dy % 2 == 1);
            }
            for dx in 0..rc + 2 {
                // alternating top edge, solid bottom edge
                grid.set(x0 + dx, y0, dx % 2 == 0);
                grid.set(x0 + dx, y0 + rr + 1, true);
            }
            for r in 0..rr {
                for c in 0..rc {
                    let dark = mapping.get(rh * rc + c, rv * rr + r);
                    grid.set(x0 + 1 + c, y0 + 1 + r, dark);
                }
            }
        }
    }
    grid
}

pub fn encode_datamatrix(payload: &str, config: &EncodingConfiguration) -> Result<MatrixSymbol> {
    let bytes = config.string_encoding.encode(payload)?;
    let utf8_eci = config.string_encoding == StringEncoding::Utf8 && !payload.is_ascii();
    let encoded = encodation::encode(&bytes, config.encode_scheme, utf8_eci)?;
    let needed = encoded.needed();

    let size = match config.code_size {
        DataMatrixSize::Auto => match SymbolSize::smallest_square(needed) {
            Some(size) => size,
            None => return too_large(format!("{} DataMatrix codewords exceed 144x144", needed)),
        },
        DataMatrixSize::Fixed { rows, cols } => match SymbolSize::lookup(rows, cols) {
            Some(size) if size.data_codewords >= needed => size,
            _ => return too_large(format!("{} codewords do not fit a {}x{} DataMatrix", needed, rows, cols)),
        },
    };
    debug!("DataMatrix {}x{} for {} data codewords", size.rows, size.cols, needed);

    let mut codewords = encoded.finish(size.data_codewords)?;
    pad_codewords(&mut codewords, size.data_codewords);
    let full = datamatrix_ecc(&codewords, size.blocks, size.ecc_codewords / size.blocks);
    let (nrow, ncol) = size.mapping_size();
    let mapping = placement::place(nrow, ncol, &full);

    Ok(MatrixSymbol { grid: assemble(size, &mapping), quiet: QUIET_ZONE, row_height: 1 })
}

pub struct DataMatrixEncoder;

impl Encoder for DataMatrixEncoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        encode_datamatrix(payload, config).map(AbstractSymbol::Matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataMatrixScheme;
    use crate::error::BarcodeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sizes() {
        let s = SymbolSize::lookup(32, 32).unwrap();
        assert_eq!((s.region_rows(), s.region_cols()), (14, 14));
        assert_eq!(s.mapping_size(), (28, 28));
        let s = SymbolSize::lookup(8, 32).unwrap();
        assert_eq!((s.region_rows(), s.region_cols()), (6, 14));
        assert!(SymbolSize::lookup(11, 11).is_none());
        // every size has room for its codewords
        for s in SIZES.iter() {
            let (r, c) = s.mapping_size();
            assert!((r * c) as usize >= 8 * (s.data_codewords + s.ecc_codewords), "{}x{}", s.rows, s.cols);
            assert_eq!(s.ecc_codewords % s.blocks, 0);
        }
    }

    #[test]
    fn test_padding() {
        let mut cw = vec![142];
        pad_codewords(&mut cw, 5);
        // 129, then 129 + (149 * 3 % 253) + 1 - 254 = 70 and onwards
        assert_eq!(cw, vec![142, 129, 70, 220, 115]);
    }

    #[test]
    fn test_finder_and_clock() {
        let symbol = encode_datamatrix("123456", &EncodingConfiguration::default()).unwrap();
        let g = &symbol.grid;
        assert_eq!((g.width, g.height), (10, 10));
        for i in 0..10 {
            assert!(g.get(0, i));
            assert!(g.get(i, 9));
            assert_eq!(g.get(i, 0), i % 2 == 0);
            assert_eq!(g.get(9, i), i % 2 == 1);
        }
    }

    fn grid_of(data: &[u8], rows: u32, cols: u32) -> ModuleGrid {
        let size = SymbolSize::lookup(rows, cols).unwrap();
        let mut codewords = data.to_vec();
        pad_codewords(&mut codewords, size.data_codewords);
        let full = datamatrix_ecc(&codewords, size.blocks, size.ecc_codewords / size.blocks);
        let (nrow, ncol) = size.mapping_size();
        assemble(size, &placement::place(nrow, ncol, &full))
    }

    #[test]
    fn test_edifact_group_at_symbol_end() {
        let config = EncodingConfiguration { encode_scheme: DataMatrixScheme::Edifact, ..Default::default() };
        // 12x12 holds 5 data codewords: one left after the group, so no unlatch
        let symbol = encode_datamatrix("ABCD", &config).unwrap();
        assert_eq!(symbol.grid, grid_of(&[240, 4, 32, 196, 129], 12, 12));

        // 14x14 leaves four: the unlatch follows the group
        let config = EncodingConfiguration { code_size: DataMatrixSize::Fixed { rows: 14, cols: 14 }, ..config };
        let symbol = encode_datamatrix("ABCD", &config).unwrap();
        assert_eq!(symbol.grid, grid_of(&[240, 4, 32, 196, 0b0111_1100], 14, 14));
    }

    #[test]
    fn test_utf8_eci() {
        let config = EncodingConfiguration { encode_scheme: DataMatrixScheme::Ascii, ..Default::default() };
        let symbol = encode_datamatrix("\u{e9}t\u{e9}", &config).unwrap();
        assert_eq!(symbol.grid, grid_of(&[241, 27, 235, 68, 235, 42, 117, 235, 68, 235, 42], 16, 16));

        let config = EncodingConfiguration { string_encoding: StringEncoding::ShiftJis, ..Default::default() };
        let symbol = encode_datamatrix("A", &config).unwrap();
        assert_eq!(symbol.grid, grid_of(&[66], 10, 10));
    }

    #[test]
    fn test_size_selection() {
        let config =
            EncodingConfiguration { code_size: DataMatrixSize::Fixed { rows: 10, cols: 10 }, ..Default::default() };
        assert!(matches!(encode_datamatrix("ABCDEFGHIJ", &config), Err(BarcodeError::PayloadTooLarge(_))));
        let config =
            EncodingConfiguration { code_size: DataMatrixSize::Fixed { rows: 16, cols: 48 }, ..Default::default() };
        let symbol = encode_datamatrix("ABCDEFGHIJ", &config).unwrap();
        assert_eq!((symbol.grid.width, symbol.grid.height), (48, 16));
        let huge = "x".repeat(3200);
        assert!(matches!(
            encode_datamatrix(&huge, &EncodingConfiguration::default()),
            Err(BarcodeError::PayloadTooLarge(_))
        ));
    }
}
