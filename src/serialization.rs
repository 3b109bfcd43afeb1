use bitstream_io::{BigEndian, BitRead, BitReader};
use image;

use std::cmp;
use std::io::Cursor;

use crate::config::{ECCLevel, Version};
use crate::error::{bit_io, Result};
use crate::symbol::ModuleGrid;
use crate::tables::alignment_pattern_positions;

// CONSTANTS
pub const MARKER_ENCODING_REGION: image::Luma<u8> = image::Luma([100u8]);
pub const MARKER_FORMAT_INFORMATION: image::Luma<u8> = image::Luma([120u8]);
pub const MARKER_VERSION_INFORMATION: image::Luma<u8> = image::Luma([140u8]);

pub const BIT_WHITE: image::Luma<u8> = image::Luma([255u8]);
pub const BIT_BLACK: image::Luma<u8> = image::Luma([0u8]);

const QUIET: u32 = 4;

pub mod masking;

/// Creates a finder pattern image (concentric squares
/// including the white separator around the finder
/// pattern)
fn create_finder_pattern() -> image::GrayImage {
    image::GrayImage::from_fn(9, 9, |x, y| {
        let r = cmp::max((x as i32 - 4).abs(), (y as i32 - 4).abs());
        if r < 2 || r == 3 {
            BIT_BLACK
        } else {
            BIT_WHITE
        }
    })
}

/// Creates an alignment pattern image
fn create_alignment_pattern() -> image::GrayImage {
    image::GrayImage::from_fn(5, 5, |x, y| {
        let r = cmp::max((x as i32 - 2).abs(), (y as i32 - 2).abs());
        if r % 2 == 0 {
            BIT_BLACK
        } else {
            BIT_WHITE
        }
    })
}

/// Creates a vector with alignment coordinate pairs (x,y). The three
/// positions that collide with the finder patterns are left out.
fn get_alignment_pattern_points(version: Version) -> Vec<(u32, u32)> {
    let coords = alignment_pattern_positions(version);
    if coords.is_empty() {
        return Vec::new();
    }
    let last_coord_index = coords.len() - 1;
    let mut points = Vec::new();
    for (i, &s) in coords.iter().enumerate() {
        for (j, &t) in coords.iter().enumerate() {
            if (i == 0 && j == 0) || (i == 0 && j == last_coord_index) || (i == last_coord_index && j == 0) {
                continue;
            }
            points.push((s, t));
        }
    }
    points
}

/// Return a basic QR image with all the functional patterns
/// painted in: the finder patterns, alignment patterns
/// and timing patterns, surrounded by the 4 module quiet zone.
///
/// During the assembly of the QR code pixel matrix
/// there are different value codes used as pixel values
/// to indicate pixels that will be filled in later.
/// As such those later stages can identify those pixels
/// easier. Final values are only 0 (black) and 255 (white).
/// All other values are codes, and are used in the following way:
///   100: the encoding region, which receives the binary code
///   120: marks the format information bits (stripes along finders),
///        2x 15 bits
///   140: marks the version information bits (blocks near upper
///        right and lower left finder) 2x 18bits
///        (only present in codes of version 7 or up)
pub fn create_qr_canvas(version: Version) -> image::GrayImage {
    let s = version.dimensions() + 2 * QUIET;
    let mut mask = image::GrayImage::from_pixel(s, s, MARKER_ENCODING_REGION);

    // mark quiet area
    for i in 0..s {
        for j in 0..QUIET {
            mask[(j, i)] = BIT_WHITE;
            mask[(i, j)] = BIT_WHITE;
            mask[(s - j - 1, i)] = BIT_WHITE;
            mask[(i, s - j - 1)] = BIT_WHITE;
        }
    }

    // apply 3 finder patterns in top and left corners
    let finder = create_finder_pattern();
    image::imageops::overlay(&mut mask, &finder, 3, 3);
    image::imageops::overlay(&mut mask, &finder, 3, s as i64 - 12);
    image::imageops::overlay(&mut mask, &finder, s as i64 - 12, 3);

    // mark timing patterns
    for i in 10..s - 12 {
        let val = if i % 2 == 0 { BIT_BLACK } else { BIT_WHITE };
        mask[(10, i)] = val;
        mask[(i, 10)] = val;
    }

    // alignment patterns, none for version 1
    let pattern = create_alignment_pattern();
    for (x, y) in get_alignment_pattern_points(version) {
        // the offset +2 we get by +4 from the quiet border
        // and -2 from the pattern center offset
        image::imageops::overlay(&mut mask, &pattern, x as i64 + 2, y as i64 + 2);
    }

    // mark format bits
    for i in 0..6 {
        mask[(12, 4 + i)] = MARKER_FORMAT_INFORMATION;
        mask[(4 + i, 12)] = MARKER_FORMAT_INFORMATION;
        mask[(s - 5 - i, 12)] = MARKER_FORMAT_INFORMATION;
        mask[(12, s - 5 - i)] = MARKER_FORMAT_INFORMATION;
    }
    mask[(12, 11)] = MARKER_FORMAT_INFORMATION;
    mask[(11, 12)] = MARKER_FORMAT_INFORMATION;
    mask[(12, 12)] = MARKER_FORMAT_INFORMATION;
    mask[(12, s - 11)] = MARKER_FORMAT_INFORMATION;
    mask[(12, s - 12)] = MARKER_FORMAT_INFORMATION;
    mask[(s - 11, 12)] = MARKER_FORMAT_INFORMATION;
    mask[(s - 12, 12)] = MARKER_FORMAT_INFORMATION;

    // mark version bits if applicable
    if version.number() >= 7 {
        for i in 0..6 {
            for j in 0..3 {
                mask[(4 + i, s - 13 - j)] = MARKER_VERSION_INFORMATION;
                mask[(s - 13 - j, 4 + i)] = MARKER_VERSION_INFORMATION;
            }
        }
    }

    mask
}

/// Insert the final codeword sequence into the encoding region of a canvas created by
/// `create_qr_canvas`.
///
/// Bits run in two module wide columns from the lower right corner, zigzagging up and
/// down and skipping the vertical timing pattern. Remainder modules stay light.
pub fn insert_data_payload(canvas: &mut image::GrayImage, version: Version, codewords: &[u8]) -> Result<()> {
    let size = version.dimensions() as i32;
    let total_bits = codewords.len() * 8;
    let mut reader = BitReader::endian(Cursor::new(codewords), BigEndian);
    let mut bits_read = 0;

    let mut right = size - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        let upward = (right + 1) & 2 == 0;
        for vert in 0..size {
            let y = if upward { size - 1 - vert } else { vert };
            for x in [right, right - 1].iter() {
                let pos = ((x + QUIET as i32) as u32, (y + QUIET as i32) as u32);
                if canvas[pos] != MARKER_ENCODING_REGION {
                    continue;
                }
                let bit = if bits_read < total_bits {
                    bits_read += 1;
                    reader.read_bit().map_err(bit_io)?
                } else {
                    false
                };
                canvas[pos] = if bit { BIT_BLACK } else { BIT_WHITE };
            }
        }
        right -= 2;
    }
    Ok(())
}

//-------------------------------------------------------------------
// FORMAT & VERSION INFO BITS
//-------------------------------------------------------------------
// lookup tables for the added 10 ECC bits plus XORing. See table C.1 in Annex C
// of the standard. The value of the 5 data bits is the index into the lookup table.

const FORMAT_INFOS_QR: [u16; 32] = [
    0x5412, 0x5125, 0x5e7c, 0x5b4b, 0x45f9, 0x40ce, 0x4f97, 0x4aa0, 0x77c4, 0x72f3, 0x7daa, 0x789d, 0x662f, 0x6318,
    0x6c41, 0x6976, 0x1689, 0x13be, 0x1ce7, 0x19d0, 0x0762, 0x0255, 0x0d0c, 0x083b, 0x355f, 0x3068, 0x3f31, 0x3a06,
    0x24b4, 0x2183, 0x2eda, 0x2bed,
];

// lookup table for version info bits, works similar to format info
static VERSION_INFOS: [u32; 34] = [
    0x07c94, 0x085bc, 0x09a99, 0x0a4d3, 0x0bbf6, 0x0c762, 0x0d847, 0x0e60d, 0x0f928, 0x10b78, 0x1145d, 0x12a17,
    0x13532, 0x149a6, 0x15683, 0x168c9, 0x177ec, 0x18ec4, 0x191e1, 0x1afab, 0x1b08e, 0x1cc1a, 0x1d33f, 0x1ed75,
    0x1f250, 0x209d5, 0x216f0, 0x228ba, 0x2379f, 0x24b0b, 0x2542e, 0x26a64, 0x27541, 0x28c69,
];

// coordinates in the QR symbol where to write format and version bits. Do not include quiet region.
#[rustfmt::skip]
static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (5, -9), (5, -10), (5, -11),
    (4, -9), (4, -10), (4, -11),
    (3, -9), (3, -10), (3, -11),
    (2, -9), (2, -10), (2, -11),
    (1, -9), (1, -10), (1, -11),
    (0, -9), (0, -10), (0, -11),
];

#[rustfmt::skip]
static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (-9, 5), (-10, 5), (-11, 5),
    (-9, 4), (-10, 4), (-11, 4),
    (-9, 3), (-10, 3), (-11, 3),
    (-9, 2), (-10, 2), (-11, 2),
    (-9, 1), (-10, 1), (-11, 1),
    (-9, 0), (-10, 0), (-11, 0),
];

#[rustfmt::skip]
static FORMAT_INFO_COORDS_QR_MAIN: [(i16, i16); 15] = [
    (0, 8), (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (7, 8), (8, 8),
    (8, 7), (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
];

#[rustfmt::skip]
static FORMAT_INFO_COORDS_QR_SIDE: [(i16, i16); 15] = [
    (8, -1), (8, -2), (8, -3), (8, -4), (8, -5), (8, -6), (8, -7), (-8, 8),
    (-7, 8), (-6, 8), (-5, 8), (-4, 8), (-3, 8), (-2, 8), (-1, 8),
];

// helper function to write format or version bits to given coordinates in QR code
// bits are the bits actually to be written (big-endian order), num_bits is how many
// bits to write. Obviously this function supports writing only up to 32 bits at a time
fn insert_bits_at(symbol: &mut image::GrayImage, bits: u32, num_bits: u32, coords: &[(i16, i16)], version: Version) {
    let mut mask = 1 << (num_bits - 1);
    let symbol_size = version.dimensions() as i16;
    let quiet_offset = QUIET as i16;

    for &(xoff, yoff) in coords {
        let color = if (mask & bits) == 0 { BIT_WHITE } else { BIT_BLACK };
        let x = quiet_offset + if xoff < 0 { xoff + symbol_size } else { xoff };
        let y = quiet_offset + if yoff < 0 { yoff + symbol_size } else { yoff };
        symbol[(x as u32, y as u32)] = color;
        mask >>= 1;
    }
}

/// compute the 15bits long format bits "format info" specifier, which contains
/// information about the used mask and ECCLevel
fn compute_format_info_bits(ecl: ECCLevel, mask_pattern: u8) -> u16 {
    let data_bits = match ecl {
        ECCLevel::L => 0b01000,
        ECCLevel::M => 0b00000,
        ECCLevel::Q => 0b11000,
        ECCLevel::H => 0b10000,
    } as usize
        | (mask_pattern as usize & 0b111);
    FORMAT_INFOS_QR[data_bits]
}

/// Compute and write format bits into symbol, together with the dark module.
pub fn insert_format_info(symbol: &mut image::GrayImage, version: Version, ecl: ECCLevel, mask_pattern: u8) {
    let format_bits = compute_format_info_bits(ecl, mask_pattern) as u32;
    insert_bits_at(symbol, format_bits, 15, &FORMAT_INFO_COORDS_QR_MAIN, version);
    insert_bits_at(symbol, format_bits, 15, &FORMAT_INFO_COORDS_QR_SIDE, version);
    symbol[(QUIET + 8, QUIET + version.dimensions() - 8)] = BIT_BLACK;
}

/// Compute and insert version info bits into symbol
/// Only does something for >= version 7 symbols.
pub fn insert_version_info(symbol: &mut image::GrayImage, version: Version) {
    if version.number() >= 7 {
        let version_bits = VERSION_INFOS[(version.number() - 7) as usize];

        insert_bits_at(symbol, version_bits, 18, &VERSION_INFO_COORDS_BL, version);
        insert_bits_at(symbol, version_bits, 18, &VERSION_INFO_COORDS_TR, version);
    }
}

/// Strip the quiet zone off a finished symbol image and return its modules.
pub fn canvas_to_grid(symbol: &image::GrayImage, version: Version) -> ModuleGrid {
    let size = version.dimensions();
    let mut grid = ModuleGrid::new(size, size);
    for y in 0..size {
        for x in 0..size {
            grid.set(x, y, symbol[(x + QUIET, y + QUIET)] == BIT_BLACK);
        }
    }
    grid
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::lookup_capacity;
    use pretty_assertions::assert_eq;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    fn count(canvas: &image::GrayImage, marker: image::Luma<u8>) -> u32 {
        canvas.pixels().filter(|&&p| p == marker).count() as u32
    }

    #[test]
    fn test_canvas_sizes() {
        assert_eq!(create_qr_canvas(v(1)).dimensions(), (21 + 8, 21 + 8));
        assert_eq!(create_qr_canvas(v(2)).dimensions(), (25 + 8, 25 + 8));
        assert_eq!(create_qr_canvas(v(40)).dimensions(), (177 + 8, 177 + 8));
    }

    #[test]
    fn test_encoding_region_matches_capacity() {
        for version in Version::all() {
            let canvas = create_qr_canvas(version);
            let modules = count(&canvas, MARKER_ENCODING_REGION);
            let codewords = lookup_capacity(version, ECCLevel::L).codewords;
            // whole codewords plus 0, 3, 4 or 7 remainder bits
            let remainder = modules - codewords * 8;
            assert!(
                [0, 3, 4, 7].contains(&remainder),
                "version {} has {} remainder bits",
                version.number(),
                remainder
            );
            assert_eq!(count(&canvas, MARKER_FORMAT_INFORMATION), 31);
        }
    }

    #[test]
    fn test_alignment_points() {
        assert!(get_alignment_pattern_points(v(1)).is_empty());
        assert_eq!(get_alignment_pattern_points(v(2)), vec![(18, 18)]);
        assert_eq!(get_alignment_pattern_points(v(7)).len(), 6);
    }

    #[test]
    fn test_payload_fills_region() {
        let version = v(1);
        let mut canvas = create_qr_canvas(version);
        insert_data_payload(&mut canvas, version, &[0xFF; 26]).unwrap();
        assert_eq!(count(&canvas, MARKER_ENCODING_REGION), 0);
        // first codeword fills the lower right 2x4 block
        for y in 17..21 {
            assert_eq!(canvas[(20 + 4, y + 4)], BIT_BLACK);
            assert_eq!(canvas[(19 + 4, y + 4)], BIT_BLACK);
        }
    }

    #[test]
    fn test_format_info() {
        // M with mask 0 is 101010000010010
        assert_eq!(compute_format_info_bits(ECCLevel::M, 0), 0x5412);
        assert_eq!(compute_format_info_bits(ECCLevel::L, 0), 0x77c4);
        let version = v(1);
        let mut canvas = create_qr_canvas(version);
        insert_format_info(&mut canvas, version, ECCLevel::M, 0);
        assert_eq!(count(&canvas, MARKER_FORMAT_INFORMATION), 0);
        // first bit of 0x5412 is 1, placed at (8, 0) and (8, size - 1)
        assert_eq!(canvas[(4, 12)], BIT_BLACK);
        assert_eq!(canvas[(12, 4 + 20)], BIT_BLACK);
    }

    #[test]
    fn test_version_info() {
        let version = v(7);
        let mut canvas = create_qr_canvas(version);
        insert_version_info(&mut canvas, version);
        assert_eq!(count(&canvas, MARKER_VERSION_INFORMATION), 0);
        // 0x07c94: the least significant bit (0) goes to (0, size - 11)
        assert_eq!(canvas[(4, 4 + 45 - 11)], BIT_WHITE);
        // the most significant of the 18 bits (0) goes to (5, size - 9)
        assert_eq!(canvas[(4 + 5, 4 + 45 - 9)], BIT_WHITE);
        // bit 13 is 1 and sits at (4, size - 10)
        assert_eq!(canvas[(4 + 4, 4 + 45 - 10)], BIT_BLACK);
    }
}
