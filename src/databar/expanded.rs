//! DataBar Expanded: GS1 element strings packed into a bit stream, cut into
//! 12 bit characters and laid out in pairs around finder patterns.

use lazy_static::lazy_static;
use log::debug;

use super::{
    bars_to_modules, group_of, interleave, modules_to_row, rss_widths, three_row_separator, widths_to_bars, CharGroup,
};
use crate::bitcoding::{read_bits, read_chunks, BitRecorder};
use crate::config::{DataBarExpandedType, EncodingConfiguration};
use crate::error::{invalid, too_large, Result};
use crate::gs1::{self, FNC1};
use crate::symbol::{BarRow, LinearSymbol};

/// Character groups (17 modules): value = odd * t + even.
const GROUPS: [CharGroup; 5] = [
    CharGroup::new(0, 4, (12, 7), (5, 2)),
    CharGroup::new(348, 20, (10, 5), (7, 4)),
    CharGroup::new(1388, 52, (8, 4), (9, 5)),
    CharGroup::new(2948, 104, (6, 3), (11, 6)),
    CharGroup::new(3988, 204, (4, 1), (13, 8)),
];

/// Finder patterns A1, A2, B1, B2 .. F2; the second of each pair is the mirror.
const FINDERS: [[u32; 5]; 12] = [
    [1, 8, 4, 1, 1],
    [1, 1, 4, 8, 1],
    [3, 6, 4, 1, 1],
    [1, 1, 4, 6, 3],
    [3, 4, 6, 1, 1],
    [1, 1, 6, 4, 3],
    [3, 2, 8, 1, 1],
    [1, 1, 8, 2, 3],
    [2, 6, 5, 1, 1],
    [1, 1, 5, 6, 2],
    [2, 2, 9, 1, 1],
    [1, 1, 9, 2, 2],
];

/// Finder sequences by number of finders, 1 = A1 .. 12 = F2.
const SEQUENCES: [&[u8]; 11] = [
    &[1],
    &[1, 2],
    &[1, 4, 3],
    &[1, 6, 3, 8],
    &[1, 10, 3, 8, 5],
    &[1, 10, 3, 8, 7, 12],
    &[1, 10, 3, 8, 9, 12, 11],
    &[1, 2, 3, 4, 5, 6, 7, 8],
    &[1, 2, 3, 4, 5, 6, 7, 10, 9],
    &[1, 2, 3, 4, 5, 6, 7, 10, 11, 12],
    &[1, 2, 3, 4, 5, 8, 7, 10, 9, 12, 11],
];

const MIN_DATA_BITS: usize = 36;
const MAX_DATA_CHARS: usize = 21;
const ROW_HEIGHT: u32 = 34;

lazy_static! {
    /// Checksum weights 3^k mod 211, eight per weight row.
    static ref WEIGHTS: Vec<u32> = {
        let mut w = Vec::with_capacity(23 * 8);
        let mut v = 1u32;
        for _ in 0..23 * 8 {
            w.push(v);
            v = v * 3 % 211;
        }
        w
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Numeric,
    Alphanumeric,
    Iso646,
}

/// (bit count, value) of a character in alphanumeric mode.
fn alphanumeric_code(c: char) -> Option<(u32, u32)> {
    match c {
        '0'..='9' => Some((5, c as u32 - '0' as u32 + 5)),
        FNC1 => Some((5, 0b01111)),
        'A'..='Z' => Some((6, c as u32 - 'A' as u32 + 0b100000)),
        '*' => Some((6, 0b111010)),
        ',' => Some((6, 0b111011)),
        '-' => Some((6, 0b111100)),
        '.' => Some((6, 0b111101)),
        '/' => Some((6, 0b111110)),
        _ => None,
    }
}

/// (bit count, value) of a character in ISO 646 mode.
fn iso646_code(c: char) -> Option<(u32, u32)> {
    const PUNCTUATION: &str = "!\"%&'()*+,-./:;<=>?_ ";
    match c {
        '0'..='9' | FNC1 => alphanumeric_code(c),
        'A'..='Z' => Some((7, c as u32 - 'A' as u32 + 0b1000000)),
        'a'..='z' => Some((7, c as u32 - 'a' as u32 + 0b1011010)),
        _ => PUNCTUATION.chars().position(|p| p == c).map(|i| (8, 0b11101000 + i as u32)),
    }
}

fn numeric_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        FNC1 => Some(10),
        _ => None,
    }
}

fn digit_run(data: &[char]) -> usize {
    data.iter().take_while(|c| c.is_ascii_digit()).count()
}

/// General purpose data compaction. Returns the mode the stream ends in.
fn encode_general(stream: &mut BitRecorder, data: &[char]) -> Result<Mode> {
    let mut mode = Mode::Numeric;
    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        match mode {
            Mode::Numeric => {
                let first = numeric_value(c);
                let second = match data.get(i + 1) {
                    Some(&next) => numeric_value(next),
                    // a trailing digit is paired with FNC1
                    None if c.is_ascii_digit() => Some(10),
                    None => None,
                };
                match (first, second) {
                    (Some(a), Some(b)) if !(a == 10 && b == 10) => {
                        stream.write(7, 11 * a + b + 8)?;
                        i += 2;
                    }
                    _ => {
                        stream.write(4, 0b0000)?;
                        mode = Mode::Alphanumeric;
                    }
                }
            }
            Mode::Alphanumeric => {
                let run = digit_run(&data[i..]);
                if run >= 6 || (run >= 4 && i + run == data.len()) {
                    stream.write(3, 0b000)?;
                    mode = Mode::Numeric;
                } else if let Some((bits, value)) = alphanumeric_code(c) {
                    stream.write(bits, value)?;
                    i += 1;
                    if c == FNC1 {
                        mode = Mode::Numeric;
                    }
                } else {
                    stream.write(5, 0b00100)?;
                    mode = Mode::Iso646;
                }
            }
            Mode::Iso646 => {
                let run = digit_run(&data[i..]);
                let alnum_run = data[i..].iter().take_while(|&&x| alphanumeric_code(x).is_some()).count();
                if run >= 4 {
                    stream.write(3, 0b000)?;
                    mode = Mode::Numeric;
                } else if alnum_run >= 10 || (alnum_run > 0 && i + alnum_run == data.len() && alnum_run >= 5) {
                    stream.write(5, 0b00100)?;
                    mode = Mode::Alphanumeric;
                } else if let Some((bits, value)) = iso646_code(c) {
                    stream.write(bits, value)?;
                    i += 1;
                    if c == FNC1 {
                        mode = Mode::Numeric;
                    }
                } else {
                    return invalid(format!("{:?} cannot be encoded in DataBar Expanded", c));
                }
            }
        }
    }
    Ok(mode)
}

fn copy_bits(target: &mut BitRecorder, source: BitRecorder) -> Result<()> {
    let len = source.len();
    for bit in read_bits(&source.into_bytes()?, len)? {
        target.write_bit(bit)?;
    }
    Ok(())
}

/// The 12 bit data character values of a bracketed GS1 payload.
pub(crate) fn data_characters(payload: &str) -> Result<Vec<u32>> {
    let elements = gs1::parse_bracketed(payload)?;
    let element_string: Vec<char> = gs1::element_string(&elements).chars().collect();

    // method header: "1" for a leading (01), "00" for general data
    let mut header = BitRecorder::new();
    let mut body = BitRecorder::new();
    let general: &[char] = if elements[0].ai == "01" {
        header.write_pattern("01")?;
        let gtin = &elements[0].data;
        let digits: Vec<u32> = gtin.chars().filter_map(|c| c.to_digit(10)).collect();
        body.write(4, digits[0])?;
        for group in digits[1..13].chunks(3) {
            body.write(10, group[0] * 100 + group[1] * 10 + group[2])?;
        }
        &element_string[16..]
    } else {
        header.write_pattern("000")?;
        &element_string[..]
    };
    let last_mode = encode_general(&mut body, general)?;

    // two bits of symbol length follow the method header
    let used = header.len() + 2 + body.len();
    let total = (((used + 11) / 12) * 12).max(MIN_DATA_BITS);
    let data_chars = total / 12;
    if data_chars > MAX_DATA_CHARS {
        return too_large(format!("DataBar Expanded holds {} data characters, {} needed", MAX_DATA_CHARS, data_chars));
    }
    let symbol_chars = data_chars + 1;

    let mut stream = BitRecorder::new();
    copy_bits(&mut stream, header)?;
    stream.write_bit(symbol_chars % 2 == 1)?;
    stream.write_bit(symbol_chars > 14)?;
    copy_bits(&mut stream, body)?;

    let pad = total - used;
    let pad_pattern = if last_mode == Mode::Numeric { "0000" } else { "" };
    let pad_bits: String = pad_pattern.chars().chain("00100".chars().cycle()).take(pad).collect();
    stream.write_pattern(&pad_bits)?;

    debug!("DataBar Expanded {} bits, {} data characters", total, data_chars);
    read_chunks(&stream.into_bytes()?, total, 12)
}

fn character(value: u32) -> Vec<u32> {
    let g = group_of(&GROUPS, value);
    let v = value - g.sum;
    let odd = rss_widths((v / g.t) as i64, g.odd_modules, 4, g.odd_widest, false);
    let even = rss_widths((v % g.t) as i64, g.even_modules, 4, g.even_widest, true);
    interleave(&odd, &even)
}

/// Weight row of symbol character `index` given the finder sequence: each
/// finder contributes a row for the character on its left and on its right.
fn weight_row(sequence: &[u8], index: usize) -> usize {
    let finder = sequence[index / 2] as usize;
    if index % 2 == 0 {
        2 * (finder - 1) - 1
    } else {
        2 * (finder - 1)
    }
}

/// Element widths of every pair: left character, finder, right character.
fn pair_elements(values: &[u32]) -> Vec<Vec<u32>> {
    let symbol_chars = values.len() + 1;
    let finders = (symbol_chars + 1) / 2;
    let sequence = SEQUENCES[finders - 1];

    let data_widths: Vec<Vec<u32>> = values.iter().map(|&v| character(v)).collect();
    let mut checksum = 0u32;
    for (i, widths) in data_widths.iter().enumerate() {
        let row = weight_row(sequence, i + 1);
        checksum += widths.iter().enumerate().map(|(j, &w)| w * WEIGHTS[row * 8 + j]).sum::<u32>();
    }
    let check = 211 * (symbol_chars as u32 - 4) + checksum % 211;
    debug!("DataBar Expanded check character {}, finders {:?}", check, sequence);

    let mut chars = vec![character(check)];
    chars.extend(data_widths);

    chars
        .chunks(2)
        .zip(sequence.iter())
        .map(|(pair, &finder)| {
            let mut elements = pair[0].clone();
            elements.extend(FINDERS[finder as usize - 1].iter());
            if let Some(right) = pair.get(1) {
                elements.extend(right.iter().rev());
            }
            elements
        })
        .collect()
}

fn row_modules(pairs: &[Vec<u32>], reversed: bool) -> Vec<bool> {
    let mut data: Vec<u32> = pairs.iter().flatten().copied().collect();
    if reversed {
        data.reverse();
    }
    let mut widths = vec![1, 1];
    widths.extend(data);
    widths.extend_from_slice(&[1, 1]);
    bars_to_modules(&widths_to_bars(&widths, false))
}

pub fn encode(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let values = data_characters(payload)?;
    let pairs = pair_elements(&values);
    let caption = gs1::human_readable(&gs1::parse_bracketed(payload)?);

    let per_row = match config.symbol_type_exp {
        DataBarExpandedType::Unstacked => pairs.len(),
        DataBarExpandedType::Stacked => config.no_of_columns.max(1) as usize,
    };
    let row_modules: Vec<Vec<bool>> =
        pairs.chunks(per_row).enumerate().map(|(r, chunk)| row_modules(chunk, r % 2 == 1)).collect();

    let mut rows: Vec<BarRow> = Vec::new();
    for (r, modules) in row_modules.iter().enumerate() {
        if r > 0 {
            rows.extend(three_row_separator(&row_modules[r - 1], modules));
        }
        rows.push(modules_to_row(modules, ROW_HEIGHT));
    }
    debug!("DataBar Expanded {} pairs in {} rows", pairs.len(), row_modules.len());

    let symbol = LinearSymbol { rows, quiet_left: 0, quiet_right: 0, text: Vec::new() };
    Ok(symbol.with_caption(caption))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compressed_gtin_method() {
        assert_eq!(data_characters("(01)98898765432106").unwrap(), vec![1693, 3702, 3207, 3282]);
    }

    #[test]
    fn test_general_method_with_padding() {
        // 34 bits padded to three characters
        let values = data_characters("(10)ABC").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0] >> 7, 0b00000);
    }

    #[test]
    fn test_iso646_characters() {
        assert_eq!(iso646_code('a'), Some((7, 0b1011010)));
        assert_eq!(iso646_code('!'), Some((8, 0b11101000)));
        assert_eq!(iso646_code(' '), Some((8, 0b11111100)));
        assert_eq!(alphanumeric_code('/'), Some((6, 0b111110)));
        assert_eq!(alphanumeric_code('a'), None);
    }

    #[test]
    fn test_weight_rows() {
        let sequence = SEQUENCES[2];
        let rows: Vec<usize> = (1..6).map(|i| weight_row(sequence, i)).collect();
        assert_eq!(rows, vec![0, 5, 6, 3, 4]);
        assert_eq!(WEIGHTS[..8], [1, 3, 9, 27, 81, 32, 96, 77]);
    }

    #[test]
    fn test_unstacked_width() {
        let symbol = encode("(01)98898765432106", &EncodingConfiguration::default()).unwrap();
        // five characters of 17, three finders of 15, two guards of 2
        assert_eq!(symbol.symbol_width(), 5 * 17 + 3 * 15 + 4);
        assert_eq!(symbol.rows.len(), 1);
        assert_eq!(symbol.text[0].text, "(01)98898765432106");
    }

    #[test]
    fn test_stacked_rows() {
        let config = EncodingConfiguration {
            symbol_type_exp: DataBarExpandedType::Stacked,
            no_of_columns: 1,
            ..Default::default()
        };
        let symbol = encode("(01)98898765432106", &config).unwrap();
        let heights: Vec<u32> = symbol.rows.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![34, 1, 1, 1, 34, 1, 1, 1, 34]);
    }

    #[test]
    fn test_too_large() {
        let payload = format!("(10){}", "ABCDEFGHIJKLMNOPQRST");
        let long = format!("{}(21){}(240){}", payload, "A1B2C3D4E5F6G7H8I9J0", "X".repeat(30));
        assert!(matches!(data_characters(&long), Err(crate::error::BarcodeError::PayloadTooLarge(_))));
    }
}
