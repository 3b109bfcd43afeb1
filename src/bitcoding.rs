use crate::config::{Encoding, Version};
use crate::error::{bit_io, invalid, Result};

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

/// A big-endian bit writer that keeps track of how many bits were written.
/// Used for QR segments, DataBar Expanded binary data and EDIFACT packing.
pub struct BitRecorder {
    writer: BitWriter<Vec<u8>, BigEndian>,
    len: usize,
}

impl Default for BitRecorder {
    fn default() -> Self {
        BitRecorder::new()
    }
}

impl BitRecorder {
    pub fn new() -> BitRecorder {
        BitRecorder { writer: BitWriter::endian(Vec::new(), BigEndian), len: 0 }
    }

    pub fn write(&mut self, bits: u32, value: u32) -> Result<()> {
        if bits == 0 {
            return Ok(());
        }
        self.writer.write(bits, value).map_err(bit_io)?;
        self.len += bits as usize;
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.writer.write_bit(bit).map_err(bit_io)?;
        self.len += 1;
        Ok(())
    }

    /// Writes a `0`/`1` string bit by bit.
    pub fn write_pattern(&mut self, pattern: &str) -> Result<()> {
        for c in pattern.chars() {
            self.write_bit(c == '1')?;
        }
        Ok(())
    }

    /// Number of bits written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Pad the last byte with zero bits and return the bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.writer.byte_align().map_err(bit_io)?;
        Ok(self.writer.into_writer())
    }
}

/// Reads `len` bits from `bytes` in chunks of `width` bits (big-endian).
pub fn read_chunks(bytes: &[u8], len: usize, width: u32) -> Result<Vec<u32>> {
    let mut reader = BitReader::endian(Cursor::new(bytes), BigEndian);
    (0..len / width as usize)
        .map(|_| reader.read::<u32>(width).map_err(bit_io))
        .collect()
}

/// Reads the first `len` bits of `bytes` as booleans.
pub fn read_bits(bytes: &[u8], len: usize) -> Result<Vec<bool>> {
    let mut reader = BitReader::endian(Cursor::new(bytes), BigEndian);
    (0..len).map(|_| reader.read_bit().map_err(bit_io)).collect()
}

//-------------------------------------------------------------------
// QR SEGMENTS
//-------------------------------------------------------------------

fn write_mode_indicator(stream: &mut BitRecorder, ec: Encoding) -> Result<()> {
    stream.write(
        4,
        match ec {
            Encoding::Numeric => 0b0001,
            Encoding::Alphanumeric => 0b0010,
            Encoding::Bytes => 0b0100,
            Encoding::Kanji => 0b1000,
        },
    )
}

fn write_charcount_indicator(
    stream: &mut BitRecorder,
    count: u32,
    version: Version,
    ec: Encoding,
) -> Result<()> {
    let num_bits = ec.num_char_count_bits(version) as u32;
    if count >= 1 << num_bits {
        return invalid(format!("{} characters do not fit a {}-bit count", count, num_bits));
    }
    stream.write(num_bits, count)
}

/// Write an ECI header to the bitstream, which changes the interpretation
/// of the following encoded message, until another ECI header is encountered.
///
/// assignment is a decimal 6-digit number between 000000 and 999999 specifying
/// the encoding (as defined by the AIM ECI specification).
///
/// The ECI header can be omitted completely; in that case, the default
/// interpretation is Shift JIS X 0208 for "kanji" mode and ISO/IEC 8859-1
/// for the other three modes.
pub fn write_eci_header(stream: &mut BitRecorder, assignment: u32) -> Result<()> {
    // write ECI mode indicator
    stream.write(4, 0b0111)?;
    if assignment < 128 {
        // encode as 0bbbbbbb
        stream.write(1, 0)?;
        stream.write(7, assignment)
    } else if assignment < 16384 {
        // encode as 10bbbbbb bbbbbbbb
        stream.write(2, 0b10)?;
        stream.write(14, assignment)
    } else {
        // encode as 110bbbbb bbbbbbbb bbbbbbbb
        stream.write(3, 0b110)?;
        stream.write(21, assignment)
    }
}

fn encode_numeric_data(stream: &mut BitRecorder, input: &[u8]) -> Result<()> {
    // group into three digits and treat them as a decimal number between 0 and 999,
    // encoded in 10 bits. A trailing pair takes 7 bits, a single digit 4.
    for triplet in input.chunks(3) {
        let mut code = 0u32;
        for &l in triplet {
            if !l.is_ascii_digit() {
                return invalid(format!("{:?} is not valid in numeric mode", l as char));
            }
            code = code * 10 + (l - b'0') as u32;
        }
        stream.write(
            match triplet.len() {
                3 => 10,
                2 => 7,
                _ => 4,
            },
            code,
        )?;
    }
    Ok(())
}

/// Value of a character in the 45 character alphanumeric set, if it is part of it.
pub fn map_alphanumeric(in_char: u8) -> Option<u8> {
    match in_char {
        0x30..=0x39 => Some(in_char - 0x30), // a digit in [0-9] maps to that value
        0x41..=0x5A => Some(in_char - 0x37), // capital letters in [A-Z] map to the next 26 values
        0x20 => Some(36),                    // space
        0x24 => Some(37),                    // dollar $
        0x25 => Some(38),                    // percent %
        0x2A => Some(39),                    // asterisk *
        0x2B => Some(40),                    // plus +
        0x2D => Some(41),                    // minus -
        0x2E => Some(42),                    // period .
        0x2F => Some(43),                    // slash /
        0x3A => Some(44),                    // colon :
        _ => None,
    }
}

fn encode_alphanumeric_data(stream: &mut BitRecorder, input: &[u8]) -> Result<()> {
    // pairs: first * 45 + second in 11 bits, a trailing char in 6 bits
    for pair in input.chunks(2) {
        let mut code = 0u32;
        for &l in pair {
            match map_alphanumeric(l) {
                Some(v) => code = code * 45 + v as u32,
                None => {
                    return invalid(format!("{:?} is not valid in alphanumeric mode", l as char))
                }
            }
        }
        stream.write(if pair.len() == 2 { 11 } else { 6 }, code)?;
    }
    Ok(())
}

fn encode_byte_data(stream: &mut BitRecorder, input: &[u8]) -> Result<()> {
    for &l in input {
        stream.write(8, l as u32)?;
    }
    Ok(())
}

/// 13-bit value of a Shift JIS double byte character, if it lies in the kanji ranges.
pub fn kanji_value(first: u8, second: u8) -> Option<u32> {
    let number = (first as u32) << 8 | second as u32;
    let number = match number {
        0x8140..=0x9FFC => number - 0x8140,
        0xE040..=0xEBBF => number - 0xC140,
        _ => return None,
    };
    Some((number >> 8) * 0xC0 + (number & 0xFF))
}

fn encode_kanji_data(stream: &mut BitRecorder, input: &[u8]) -> Result<()> {
    // input is Shift JIS (JIS X 0208), two bytes per character, each
    // compacted into a 13 bit codeword
    if input.len() % 2 != 0 {
        return invalid("kanji mode needs an even number of Shift JIS bytes");
    }
    for pair in input.chunks(2) {
        match kanji_value(pair[0], pair[1]) {
            Some(code) => stream.write(13, code)?,
            None => return invalid("character outside the Shift JIS kanji ranges"),
        }
    }
    Ok(())
}

/// Number of characters a segment of `input` bytes counts in the given mode.
pub fn char_count(input: &[u8], ec: Encoding) -> usize {
    match ec {
        Encoding::Kanji => input.len() / 2,
        _ => input.len(),
    }
}

/// Write a given sequence of bytes to a bitstream as one segment: mode indicator,
/// character count and the compacted data.
///
/// To use non-default ECIs, write the ECI header to the stream first, then call this
/// function to write data in any of the four supported encoding modes.
pub fn encode_data_segment(
    stream: &mut BitRecorder,
    input: &[u8],
    ec: Encoding,
    version: Version,
) -> Result<()> {
    write_mode_indicator(stream, ec)?;
    write_charcount_indicator(stream, char_count(input, ec) as u32, version, ec)?;
    match ec {
        Encoding::Numeric => encode_numeric_data(stream, input),
        Encoding::Alphanumeric => encode_alphanumeric_data(stream, input),
        Encoding::Bytes => encode_byte_data(stream, input),
        Encoding::Kanji => encode_kanji_data(stream, input),
    }
}

/// Terminate the bit stream, pad it to whole bytes and fill the remaining data
/// capacity with the alternating pad codewords 0xEC 0x11.
pub fn finalize_bitstream(mut stream: BitRecorder, data_codewords: usize) -> Result<Vec<u8>> {
    let capacity_bits = data_codewords * 8;
    if stream.len() > capacity_bits {
        return invalid("bit stream exceeds the symbol capacity");
    }
    // terminator of up to four zero bits
    let terminator = std::cmp::min(4, capacity_bits - stream.len()) as u32;
    stream.write(terminator, 0)?;
    let mut bytes = stream.into_bytes()?;
    for pad in [0xEC_u8, 0x11].iter().cycle() {
        if bytes.len() >= data_codewords {
            break;
        }
        bytes.push(*pad);
    }
    Ok(bytes)
}

//-------------------------------------------------------------------
// TESTS
//-------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    #[test]
    fn test_numeric_example_1() {
        let mut stream = BitRecorder::new();
        encode_data_segment(&mut stream, b"01234567", Encoding::Numeric, v(1)).unwrap();
        assert_eq!(stream.len(), 41);
        assert_eq!(
            stream.into_bytes().unwrap(),
            [0b0001_0000, 0b0010_0000, 0b0000_1100, 0b0101_0110, 0b0110_0001, 0b1000_0000]
        );
    }

    #[test]
    fn test_alphanumeric_example() {
        let mut stream = BitRecorder::new();
        encode_data_segment(&mut stream, b"AC-42", Encoding::Alphanumeric, v(1)).unwrap();
        assert_eq!(stream.len(), 41);
        assert_eq!(
            stream.into_bytes().unwrap(),
            [0b0010_0000, 0b0010_1001, 0b1100_1110, 0b1110_0111, 0b0010_0001, 0b0000_0000]
        );
    }

    #[test]
    fn test_kanji_example() {
        let mut stream = BitRecorder::new();
        encode_data_segment(&mut stream, &[0x93, 0x5F, 0xE4, 0xAA], Encoding::Kanji, v(1)).unwrap();
        assert_eq!(stream.len(), 38);
        assert_eq!(
            stream.into_bytes().unwrap(),
            [0b1000_0000, 0b0010_0110, 0b1100_1111, 0b1110_1010, 0b1010_1000]
        );
    }

    #[test]
    fn test_invalid_characters() {
        let mut stream = BitRecorder::new();
        assert!(encode_data_segment(&mut stream, b"12a", Encoding::Numeric, v(1)).is_err());
        let mut stream = BitRecorder::new();
        assert!(encode_data_segment(&mut stream, b"abc", Encoding::Alphanumeric, v(1)).is_err());
    }

    #[test]
    fn test_finalize_pads() {
        let mut stream = BitRecorder::new();
        encode_data_segment(&mut stream, b"01234567", Encoding::Numeric, v(1)).unwrap();
        let bytes = finalize_bitstream(stream, 16).unwrap();
        assert_eq!(
            bytes,
            [0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11]
        );
    }

    #[test]
    fn test_read_chunks() {
        assert_eq!(read_chunks(&[0xAB, 0xCD, 0xEF], 24, 12).unwrap(), vec![0xABC, 0xDEF]);
        assert_eq!(read_bits(&[0b1010_0000], 3).unwrap(), vec![true, false, true]);
    }
}
