//! PDF417 high level encoding: the payload is cut into numeric, text and byte
//! runs and each run is compacted into codewords 0..900.
use log::debug;

const LATCH_TEXT: u16 = 900;
pub(super) const LATCH_BYTE: u16 = 901;
const LATCH_NUMERIC: u16 = 902;
const SHIFT_BYTE: u16 = 913;
const LATCH_BYTE_SIX: u16 = 924;

/// Digit runs shorter than this stay in text compaction.
const MIN_NUMERIC_RUN: usize = 13;
/// Text runs shorter than this do not interrupt byte compaction.
const MIN_TEXT_RUN: usize = 5;

const MIXED: &[u8] = b"0123456789&\r\t,:#-.$/+%*=^";
const PUNCTUATION: &[u8] = b";<>@[\\]_`~!\r\t,:\n-.$/\"|*()?{}'";

// sub mode switches, values 25..29 of a text sub mode
const PL: u8 = 25;
const LL: u8 = 27;
const AS: u8 = 27;
const ML: u8 = 28;
const AL: u8 = 28;
const PS: u8 = 29;
const PAL: u8 = 29;
const SPACE: u8 = 26;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Text,
    Byte,
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubMode {
    Alpha,
    Lower,
    Mixed,
    Punctuation,
}

fn is_alpha(c: u8) -> bool {
    c == b' ' || c.is_ascii_uppercase()
}

fn is_lower(c: u8) -> bool {
    c == b' ' || c.is_ascii_lowercase()
}

fn mixed_value(c: u8) -> Option<u8> {
    MIXED.iter().position(|&m| m == c).map(|p| p as u8)
}

fn punctuation_value(c: u8) -> Option<u8> {
    PUNCTUATION.iter().position(|&m| m == c).map(|p| p as u8)
}

fn is_text(c: u8) -> bool {
    is_alpha(c) || is_lower(c) || mixed_value(c).is_some() || punctuation_value(c).is_some()
}

fn digit_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Text encodable bytes from `start`, stopping in front of a long digit run.
fn text_run(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        let digits = digit_run(bytes, idx);
        if digits >= MIN_NUMERIC_RUN {
            break;
        }
        if digits > 0 {
            idx += digits;
            continue;
        }
        if !is_text(bytes[idx]) {
            break;
        }
        idx += 1;
    }
    idx - start
}

/// Bytes from `start` up to the next numeric or text run worth switching to.
fn byte_run(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        if idx > start && (digit_run(bytes, idx) >= MIN_NUMERIC_RUN || text_run(bytes, idx) >= MIN_TEXT_RUN) {
            break;
        }
        idx += 1;
    }
    idx - start
}

/// Text compaction of `bytes`, continuing from sub mode `sub`. Returns the
/// codewords and the sub mode in effect afterwards.
fn text(bytes: &[u8], mut sub: SubMode) -> (Vec<u16>, SubMode) {
    let mut values: Vec<u8> = Vec::with_capacity(bytes.len() * 2);
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match sub {
            SubMode::Alpha => {
                if is_alpha(c) {
                    values.push(if c == b' ' { SPACE } else { c - b'A' });
                    i += 1;
                } else if is_lower(c) {
                    values.push(LL);
                    sub = SubMode::Lower;
                } else if mixed_value(c).is_some() {
                    values.push(ML);
                    sub = SubMode::Mixed;
                } else if let Some(v) = punctuation_value(c) {
                    values.extend_from_slice(&[PS, v]);
                    i += 1;
                }
            }
            SubMode::Lower => {
                if is_lower(c) {
                    values.push(if c == b' ' { SPACE } else { c - b'a' });
                    i += 1;
                } else if is_alpha(c) {
                    values.extend_from_slice(&[AS, c - b'A']);
                    i += 1;
                } else if mixed_value(c).is_some() {
                    values.push(ML);
                    sub = SubMode::Mixed;
                } else if let Some(v) = punctuation_value(c) {
                    values.extend_from_slice(&[PS, v]);
                    i += 1;
                }
            }
            SubMode::Mixed => {
                if let Some(v) = mixed_value(c) {
                    values.push(v);
                    i += 1;
                } else if c == b' ' {
                    values.push(SPACE);
                    i += 1;
                } else if is_alpha(c) {
                    values.push(AL);
                    sub = SubMode::Alpha;
                } else if is_lower(c) {
                    values.push(LL);
                    sub = SubMode::Lower;
                } else if let Some(v) = punctuation_value(c) {
                    if bytes.get(i + 1).map_or(false, |&n| punctuation_value(n).is_some()) {
                        values.push(PL);
                        sub = SubMode::Punctuation;
                    } else {
                        values.extend_from_slice(&[PS, v]);
                        i += 1;
                    }
                }
            }
            SubMode::Punctuation => {
                if let Some(v) = punctuation_value(c) {
                    values.push(v);
                    i += 1;
                } else {
                    values.push(PAL);
                    sub = SubMode::Alpha;
                }
            }
        }
    }
    if values.len() % 2 == 1 {
        values.push(PS);
    }
    let codewords = values.chunks(2).map(|p| 30 * p[0] as u16 + p[1] as u16).collect();
    (codewords, sub)
}

/// Base 900 digits of the decimal number "1" followed by `digits`.
fn base900(digits: &[u8]) -> Vec<u16> {
    let mut number: Vec<u32> = std::iter::once(1).chain(digits.iter().map(|&d| (d - b'0') as u32)).collect();
    let mut out = Vec::new();
    while !number.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for &d in &number {
            let current = remainder * 10 + d;
            let q = current / 900;
            remainder = current % 900;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q);
            }
        }
        out.push(remainder as u16);
        number = quotient;
    }
    out.reverse();
    out
}

/// Numeric compaction, 44 digits per group.
fn numeric(digits: &[u8]) -> Vec<u16> {
    digits.chunks(44).flat_map(base900).collect()
}

/// Byte compaction: six bytes become five base 900 codewords, a tail shorter
/// than six bytes is copied one codeword per byte.
fn bytes_group(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut chunks = bytes.chunks_exact(6);
    for chunk in &mut chunks {
        let mut value = chunk.iter().fold(0u64, |acc, &b| acc << 8 | b as u64);
        let mut group = [0u16; 5];
        for slot in group.iter_mut().rev() {
            *slot = (value % 900) as u16;
            value /= 900;
        }
        out.extend_from_slice(&group);
    }
    out.extend(chunks.remainder().iter().map(|&b| b as u16));
    out
}

/// Compacts the payload into data codewords, without length descriptor.
pub fn compact(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::new();
    let mut mode = Mode::Text;
    let mut sub = SubMode::Alpha;
    let mut p = 0;
    while p < bytes.len() {
        let digits = digit_run(bytes, p);
        if digits >= MIN_NUMERIC_RUN {
            out.push(LATCH_NUMERIC);
            out.extend(numeric(&bytes[p..p + digits]));
            mode = Mode::Numeric;
            p += digits;
            continue;
        }

        let t = text_run(bytes, p);
        if t >= MIN_TEXT_RUN || (t > 0 && (mode == Mode::Text || p + t == bytes.len())) {
            if mode != Mode::Text {
                out.push(LATCH_TEXT);
                mode = Mode::Text;
                sub = SubMode::Alpha;
            }
            let (codewords, next) = text(&bytes[p..p + t], sub);
            out.extend(codewords);
            sub = next;
            p += t;
            continue;
        }

        let b = byte_run(bytes, p);
        if b == 1 && mode == Mode::Text {
            out.push(SHIFT_BYTE);
            out.push(bytes[p] as u16);
        } else {
            out.push(if b % 6 == 0 { LATCH_BYTE_SIX } else { LATCH_BYTE });
            out.extend(bytes_group(&bytes[p..p + b]));
            mode = Mode::Byte;
        }
        p += b;
    }
    debug!("PDF417 compacted {} bytes into {} codewords", bytes.len(), out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text() {
        assert_eq!(text(b"PDF417", SubMode::Alpha).0, vec![453, 178, 121, 239]);
        assert_eq!(
            text(b"Hello, World!", SubMode::Alpha),
            (vec![237, 131, 344, 853, 808, 687, 437, 333, 880], SubMode::Lower)
        );
    }

    #[test]
    fn test_numeric() {
        assert_eq!(numeric(b"000213298174000"), vec![1, 624, 434, 632, 282, 200]);
        assert_eq!(base900(b"1"), vec![11]);
    }

    #[test]
    fn test_bytes() {
        assert_eq!(bytes_group(b"alcool"), vec![163, 238, 432, 766, 244]);
        assert_eq!(bytes_group(&[0xE9, b't', 0xE9]), vec![233, 116, 233]);
    }

    #[test]
    fn test_compact_switches_modes() {
        assert_eq!(compact(b"PDF417"), vec![453, 178, 121, 239]);
        assert_eq!(compact(b"000213298174000"), vec![902, 1, 624, 434, 632, 282, 200]);
        assert_eq!(compact(&[0xE9; 6]), vec![924, 391, 899, 481, 514, 273]);
        assert_eq!(compact(&[0xE9; 7]), vec![901, 391, 899, 481, 514, 273, 233]);
        // a lone byte inside text is shifted, not latched
        assert_eq!(compact(b"AB\xe9"), vec![1, 913, 233]);
        assert_eq!(compact(b"ABCDE\xe9FGHIJ"), vec![1, 63, 149, 913, 233, 156, 218, 299]);
    }
}
