//! DataMatrix encodation schemes. `Auto` encodes the payload with every scheme
//! that can represent it and keeps the shortest codeword sequence.

use log::debug;

use crate::bitcoding::BitRecorder;
use crate::config::DataMatrixScheme;
use crate::error::{invalid, Result};

const LATCH_C40: u8 = 230;
const LATCH_BASE256: u8 = 231;
const UPPER_SHIFT: u8 = 235;
const LATCH_X12: u8 = 238;
const LATCH_TEXT: u8 = 239;
const LATCH_EDIFACT: u8 = 240;
const UNLATCH: u8 = 254;
const EDIFACT_UNLATCH: u32 = 0b011111;
const ECI: u8 = 241;
/// ECI 26 (UTF-8), written as the assignment number plus one.
const ECI_UTF8: u8 = 27;

/// Codewords of an encoded payload. A payload ending in EDIFACT keeps its last
/// partial group of characters open until the symbol capacity is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub codewords: Vec<u8>,
    edifact_rest: Option<Vec<u8>>,
}

impl Encoded {
    fn closed(codewords: Vec<u8>) -> Encoded {
        Encoded { codewords, edifact_rest: None }
    }

    /// Smallest number of data codewords the payload needs.
    pub fn needed(&self) -> usize {
        self.codewords.len() + self.edifact_rest.as_ref().map_or(0, Vec::len)
    }

    /// Final codewords for a symbol of `capacity` data codewords. Decoders leave
    /// EDIFACT on their own when fewer than three codewords remain, so the open
    /// characters go out as ASCII there and the unlatch is dropped.
    pub fn finish(self, capacity: usize) -> Result<Vec<u8>> {
        let mut out = self.codewords;
        if let Some(rest) = self.edifact_rest {
            let available = capacity.saturating_sub(out.len());
            if available >= 3 {
                let mut stream = BitRecorder::new();
                for &c in &rest {
                    stream.write(6, (c & 0x3F) as u32)?;
                }
                stream.write(6, EDIFACT_UNLATCH)?;
                out.extend(stream.into_bytes()?);
            } else {
                out.extend(ascii(&rest));
            }
        }
        Ok(out)
    }
}

/// Encodes `bytes` with `scheme`, behind an ECI 26 designator when `utf8_eci`.
pub fn encode(bytes: &[u8], scheme: DataMatrixScheme, utf8_eci: bool) -> Result<Encoded> {
    if bytes.is_empty() {
        return invalid("DataMatrix payload is empty");
    }
    let prefix: &[u8] = if utf8_eci { &[ECI, ECI_UTF8] } else { &[] };
    let mut encoded = encode_scheme(bytes, scheme, prefix.len())?;
    let mut codewords = prefix.to_vec();
    codewords.append(&mut encoded.codewords);
    encoded.codewords = codewords;
    Ok(encoded)
}

fn encode_scheme(bytes: &[u8], scheme: DataMatrixScheme, offset: usize) -> Result<Encoded> {
    match scheme {
        DataMatrixScheme::Ascii => Ok(Encoded::closed(ascii(bytes))),
        DataMatrixScheme::C40 => Ok(Encoded::closed(c40_text(bytes, false))),
        DataMatrixScheme::Text => Ok(Encoded::closed(c40_text(bytes, true))),
        DataMatrixScheme::X12 => x12(bytes).map(Encoded::closed),
        DataMatrixScheme::Edifact => edifact(bytes),
        DataMatrixScheme::Base256 => Ok(Encoded::closed(base256(bytes, offset))),
        DataMatrixScheme::Auto => {
            let candidates = [
                DataMatrixScheme::Ascii,
                DataMatrixScheme::C40,
                DataMatrixScheme::Text,
                DataMatrixScheme::X12,
                DataMatrixScheme::Edifact,
                DataMatrixScheme::Base256,
            ];
            let mut best: Option<(DataMatrixScheme, Encoded)> = None;
            for &candidate in candidates.iter() {
                if let Ok(encoded) = encode_scheme(bytes, candidate, offset) {
                    if best.as_ref().map_or(true, |(_, b)| encoded.needed() < b.needed()) {
                        best = Some((candidate, encoded));
                    }
                }
            }
            let (chosen, encoded) =
                best.unwrap_or_else(|| (DataMatrixScheme::Ascii, Encoded::closed(ascii(bytes))));
            debug!("DataMatrix encodation {:?}, {} codewords", chosen, encoded.needed());
            Ok(encoded)
        }
    }
}

/// ASCII: digit pairs in one codeword, extended characters behind an upper shift.
pub fn ascii(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match bytes.get(i + 1) {
            Some(&n) if c.is_ascii_digit() && n.is_ascii_digit() => {
                out.push(130 + (c - b'0') * 10 + (n - b'0'));
                i += 2;
                continue;
            }
            _ => {}
        }
        if c < 128 {
            out.push(c + 1);
        } else {
            out.push(UPPER_SHIFT);
            out.push(c - 128 + 1);
        }
        i += 1;
    }
    out
}

/// C40 (upper case basic set) or TEXT (lower case basic set) values of one byte.
fn c40_values(c: u8, text: bool) -> Vec<u8> {
    if c >= 128 {
        let mut values = vec![1, 30];
        values.extend(c40_values(c - 128, text));
        return values;
    }
    match c {
        b' ' => vec![3],
        b'0'..=b'9' => vec![c - b'0' + 4],
        0..=31 => vec![0, c],
        33..=47 => vec![1, c - 33],
        58..=64 => vec![1, c - 58 + 15],
        91..=95 => vec![1, c - 91 + 22],
        b'A'..=b'Z' if text => vec![2, c - b'A' + 1],
        b'A'..=b'Z' => vec![c - b'A' + 14],
        b'a'..=b'z' if text => vec![c - b'a' + 14],
        _ => vec![2, c - 96],
    }
}

fn pack_triplets(values: &[u8], out: &mut Vec<u8>) {
    for t in values.chunks(3) {
        let v = 1600 * t[0] as u32 + 40 * t[1] as u32 + t[2] as u32 + 1;
        out.push((v / 256) as u8);
        out.push((v % 256) as u8);
    }
}

/// Number of leading bytes whose values fill whole triplets, with at most two
/// values left over; the rest goes to ASCII after the unlatch.
fn triplet_split(per_char: &[Vec<u8>]) -> usize {
    let mut split = per_char.len();
    let mut total: usize = per_char.iter().map(Vec::len).sum();
    while total % 3 == 1 {
        split -= 1;
        total -= per_char[split].len();
    }
    split
}

fn c40_text(bytes: &[u8], text: bool) -> Vec<u8> {
    let per_char: Vec<Vec<u8>> = bytes.iter().map(|&c| c40_values(c, text)).collect();
    let split = triplet_split(&per_char);
    let mut values: Vec<u8> = per_char[..split].iter().flatten().copied().collect();
    if values.len() % 3 == 2 {
        // shift 1 pads the last triplet
        values.push(0);
    }

    let mut out = vec![if text { LATCH_TEXT } else { LATCH_C40 }];
    pack_triplets(&values, &mut out);
    out.push(UNLATCH);
    out.extend(ascii(&bytes[split..]));
    out
}

fn x12_value(c: u8) -> Option<u8> {
    match c {
        b'\r' => Some(0),
        b'*' => Some(1),
        b'>' => Some(2),
        b' ' => Some(3),
        b'0'..=b'9' => Some(c - b'0' + 4),
        b'A'..=b'Z' => Some(c - b'A' + 14),
        _ => None,
    }
}

fn x12(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut values = Vec::with_capacity(bytes.len());
    for &c in bytes {
        match x12_value(c) {
            Some(v) => values.push(v),
            None => return invalid(format!("{:?} is not in the X12 set", c as char)),
        }
    }
    let split = values.len() - values.len() % 3;
    let mut out = vec![LATCH_X12];
    pack_triplets(&values[..split], &mut out);
    out.push(UNLATCH);
    out.extend(ascii(&bytes[split..]));
    Ok(out)
}

/// EDIFACT: four characters in three codewords. The incomplete last group and
/// the unlatch are written by `Encoded::finish`.
fn edifact(bytes: &[u8]) -> Result<Encoded> {
    if let Some(&c) = bytes.iter().find(|c| !(32..=94).contains(*c)) {
        return invalid(format!("{:?} is not in the EDIFACT set", c as char));
    }
    let split = bytes.len() - bytes.len() % 4;
    let mut stream = BitRecorder::new();
    for &c in &bytes[..split] {
        stream.write(6, (c & 0x3F) as u32)?;
    }
    let mut codewords = vec![LATCH_EDIFACT];
    codewords.extend(stream.into_bytes()?);
    Ok(Encoded { codewords, edifact_rest: Some(bytes[split..].to_vec()) })
}

/// 255-state randomisation of Base 256 codewords at 1-based `position`.
fn randomize_255(value: u8, position: usize) -> u8 {
    let pseudo = (149 * position) % 255 + 1;
    ((value as usize + pseudo) % 256) as u8
}

/// Base 256 after `offset` codewords written ahead of the latch.
fn base256(bytes: &[u8], offset: usize) -> Vec<u8> {
    let n = bytes.len();
    let mut field: Vec<u8> = if n <= 249 { vec![n as u8] } else { vec![(n / 250 + 249) as u8, (n % 250) as u8] };
    field.extend_from_slice(bytes);

    let mut out = vec![LATCH_BASE256];
    for (i, &v) in field.iter().enumerate() {
        // the latch holds position offset + 1
        out.push(randomize_255(v, offset + i + 2));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii() {
        assert_eq!(ascii(b"123456"), vec![142, 164, 186]);
        assert_eq!(ascii(b"A1"), vec![66, 50]);
        assert_eq!(ascii("é".as_bytes()), vec![235, 68, 235, 42]);
    }

    #[test]
    fn test_c40_and_text() {
        assert_eq!(c40_text(b"AIMAIMAIM", false), vec![230, 91, 11, 91, 11, 91, 11, 254]);
        assert_eq!(c40_text(b"aimaimaim", true), vec![239, 91, 11, 91, 11, 91, 11, 254]);
        // one value left over: the last character goes to ASCII
        assert_eq!(c40_text(b"AIMA", false), vec![230, 91, 11, 254, 66]);
        // two values left over: padded with shift 1
        let v = 1600 * 14 + 40 * 22 + 1;
        assert_eq!(c40_text(b"AI", false), vec![230, (v / 256) as u8, (v % 256) as u8, 254]);
    }

    #[test]
    fn test_x12() {
        assert_eq!(x12(b"ABC>").unwrap(), vec![238, 89, 233, 254, 63]);
        assert!(x12(b"abc").is_err());
    }

    #[test]
    fn test_edifact() {
        assert_eq!(edifact(b"AB").unwrap().finish(10).unwrap(), vec![240, 4, 39, 192]);
        assert!(edifact(b"ab").is_err());
    }

    #[test]
    fn test_edifact_end_of_data() {
        // "ABCD" fills one group exactly: 000001 000010 000011 000100
        let encoded = edifact(b"ABCD").unwrap();
        assert_eq!(encoded.needed(), 4);
        // two codewords left in the symbol: no unlatch, the decoder is back in ASCII
        assert_eq!(encoded.clone().finish(6).unwrap(), vec![240, 4, 32, 196]);
        // room for a full group: the unlatch follows
        assert_eq!(encoded.finish(8).unwrap(), vec![240, 4, 32, 196, 0b0111_1100]);

        // "ABCDE": the trailing E goes out as ASCII when the symbol ends right after
        let encoded = edifact(b"ABCDE").unwrap();
        assert_eq!(encoded.needed(), 5);
        assert_eq!(encoded.clone().finish(5).unwrap(), vec![240, 4, 32, 196, b'E' + 1]);
        assert_eq!(encoded.finish(8).unwrap(), vec![240, 4, 32, 196, 0b0001_0101, 0b1111_0000]);
    }

    #[test]
    fn test_utf8_eci() {
        let encoded = encode("\u{e9}".as_bytes(), DataMatrixScheme::Ascii, true).unwrap();
        assert_eq!(encoded.codewords, vec![241, 27, 235, 68, 235, 42]);
        // Base 256 randomisation counts the designator codewords
        let encoded = encode(b"ab", DataMatrixScheme::Base256, true).unwrap();
        let randomized: Vec<u8> = [2, b'a', b'b'].iter().enumerate().map(|(i, &v)| randomize_255(v, i + 4)).collect();
        assert_eq!(encoded.codewords[..3], [241, 27, 231]);
        assert_eq!(encoded.codewords[3..], randomized[..]);
    }

    #[test]
    fn test_base256() {
        assert_eq!(base256(b"ab", 0), vec![231, 46, 34, 185]);
        let long = vec![0u8; 300];
        let out = base256(&long, 0);
        assert_eq!(out.len(), 1 + 2 + 300);
        assert_eq!(out[1], randomize_255(250, 2));
    }

    #[test]
    fn test_auto_picks_shortest() {
        assert_eq!(encode(b"123456", DataMatrixScheme::Auto, false).unwrap().codewords, vec![142, 164, 186]);
        let c40 = encode(b"ABCDEFGHIJKL", DataMatrixScheme::Auto, false).unwrap();
        assert!(c40.needed() < 12);
        assert!(encode(b"", DataMatrixScheme::Auto, false).is_err());
    }
}
