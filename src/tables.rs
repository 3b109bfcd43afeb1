/// Contains lookup tables and other computation functions that provide reference
/// data needed for encoding a QR code, such as the capacity of each
/// code configuration in different encodings, and its block structure.
use crate::config::{ECCLevel, Encoding, SymbolConfig, Version};

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::ops::Index;

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolCapacity {
    pub codewords: u32,      // total number of codewords in this symbol type (depends only on version)
    pub data_codewords: u32, // of those codewords, how many carry data (as opposed to ecc)
    pub data_bits: u32,      // how many data bits?
    pub blocks: u32,         // number of error correction blocks
    pub ecc_per_block: u32,  // ecc codewords in every block

    chars_numeric: u32,  // data capacity measured in digits when using numeric encoding
    chars_alphanum: u32, // data capacity measured in alphanum chars when usign alphanum encoding
    chars_bytes: u32,    // data capacity measured in bytes when using bytes encoding
    chars_kanji: u32,    // data capacity measured in kanji chars when using kanji encoding
}

impl Index<Encoding> for SymbolCapacity {
    type Output = u32;

    fn index(&self, ty: Encoding) -> &Self::Output {
        match ty {
            Encoding::Numeric => &self.chars_numeric,
            Encoding::Alphanumeric => &self.chars_alphanum,
            Encoding::Bytes => &self.chars_bytes,
            Encoding::Kanji => &self.chars_kanji,
        }
    }
}

impl SymbolCapacity {
    /// Data codeword count of each block; the short blocks come first.
    pub fn block_sizes(&self) -> Vec<usize> {
        let blocks = self.blocks as usize;
        let short = self.data_codewords as usize / blocks;
        let long_blocks = self.data_codewords as usize % blocks;
        (0..blocks)
            .map(|i| if i < blocks - long_blocks { short } else { short + 1 })
            .collect()
    }

    fn compute(config: SymbolConfig) -> SymbolCapacity {
        let SymbolConfig(version, ecc) = config;
        let v = version.number() as usize;
        let e = ecc.ordinal();
        let codewords = raw_data_modules(version) / 8;
        let ecc_per_block = ECC_CODEWORDS_PER_BLOCK[e][v];
        let blocks = NUM_ERROR_CORRECTION_BLOCKS[e][v];
        let data_codewords = codewords - ecc_per_block * blocks;
        let data_bits = data_codewords * 8;

        let chars = |ec: Encoding| {
            // 4 bits mode indicator plus the char count field
            let available = data_bits as usize - 4 - ec.num_char_count_bits(version);
            let per_char_limit = match ec {
                Encoding::Kanji => 13,
                Encoding::Bytes => 8,
                _ => 1,
            };
            let mut n = available / per_char_limit;
            while n > 0 && ec.num_encoded_bits(n) > available {
                n -= 1;
            }
            n as u32
        };

        SymbolCapacity {
            codewords,
            data_codewords,
            data_bits,
            blocks,
            ecc_per_block,
            chars_numeric: chars(Encoding::Numeric),
            chars_alphanum: chars(Encoding::Alphanumeric),
            chars_bytes: chars(Encoding::Bytes),
            chars_kanji: chars(Encoding::Kanji),
        }
    }
}

/// Number of modules available for data and ecc, after all function patterns
/// and the format/version areas are taken out.
fn raw_data_modules(version: Version) -> u32 {
    let v = version.number() as u32;
    let mut result = (16 * v + 128) * v + 64;
    if v >= 2 {
        let num_align = v / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if v >= 7 {
            result -= 36;
        }
    }
    result
}

// ISO/IEC 18004 table 9, indexed by [ecc level][version]
#[rustfmt::skip]
const ECC_CODEWORDS_PER_BLOCK: [[u32; 41]; 4] = [
    [0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28],
    [0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
];

#[rustfmt::skip]
const NUM_ERROR_CORRECTION_BLOCKS: [[u32; 41]; 4] = [
    [0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25],
    [0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49],
    [0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68],
    [0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81],
];

const ECC_LEVELS: [ECCLevel; 4] = [ECCLevel::L, ECCLevel::M, ECCLevel::Q, ECCLevel::H];

lazy_static! {
    pub static ref SYMBOL_CAPACITY_TABLE: HashMap<SymbolConfig, SymbolCapacity> = Version::all()
        .flat_map(|v| ECC_LEVELS.iter().map(move |&e| SymbolConfig::new(v, e)))
        .map(|config| (config, SymbolCapacity::compute(config)))
        .collect();
}

/// Convenience function that just indexes into the static table
pub fn lookup_capacity(v: Version, ecc: ECCLevel) -> SymbolCapacity {
    SYMBOL_CAPACITY_TABLE[&SymbolConfig::new(v, ecc)]
}

/// Row/column centres of the alignment patterns of a version.
pub fn alignment_pattern_positions(version: Version) -> Vec<u32> {
    let v = version.number() as u32;
    if v == 1 {
        return Vec::new();
    }
    let num_align = v / 7 + 2;
    let step = if v == 32 { 26 } else { (v * 4 + num_align * 2 + 1) / (num_align * 2 - 2) * 2 };
    let size = version.dimensions();
    let mut positions: Vec<u32> = (0..num_align - 1).map(|i| size - 7 - i * step).collect();
    positions.push(6);
    positions.reverse();
    positions
}
