use log::debug;

use super::{bars_from_bits, QUIET_ZONE};
use crate::checksum::{mod47, CODE39_CHARSET};
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{normalize, Bar, LinearSymbol};

/// Nine module patterns of the 47 values: the 43 Code39 characters followed by the
/// shift characters ($) (%) (/) (+).
#[rustfmt::skip]
const PATTERNS: [u32; 47] = [
    0x114, 0x148, 0x144, 0x142, 0x128, 0x124, 0x122, 0x150, 0x112, 0x10A, // 0-9
    0x1A8, 0x1A4, 0x1A2, 0x194, 0x192, 0x18A, 0x168, 0x164, 0x162, 0x134, // A-J
    0x11A, 0x158, 0x14C, 0x146, 0x12C, 0x116, 0x1B4, 0x1B2, 0x1AC, 0x1A6, // K-T
    0x196, 0x19A, 0x16C, 0x166, 0x136, 0x13A,                             // U-Z
    0x12E, 0x1D4, 0x1D2, 0x1CA, 0x16E, 0x176, 0x1AE,                      // - . space $ / + %
    0x126, 0x1DA, 0x1D6, 0x132,                                           // ($) (%) (/) (+)
];

const START_STOP: u32 = 0x15E;

const SHIFT_DOLLAR: u8 = 43;
const SHIFT_PERCENT: u8 = 44;
const SHIFT_SLASH: u8 = 45;
const SHIFT_PLUS: u8 = 46;

fn native_value(c: u8) -> Option<u8> {
    CODE39_CHARSET.iter().position(|&x| x == c).map(|v| v as u8)
}

fn letter(c: u8) -> u8 {
    native_value(c).unwrap_or(0)
}

/// Symbol values of one ASCII character, through the full ASCII shift table.
fn full_ascii(c: u8) -> Option<Vec<u8>> {
    let values = match c {
        0 => vec![SHIFT_PERCENT, letter(b'U')],
        1..=26 => vec![SHIFT_DOLLAR, letter(b'A' + c - 1)],
        27..=31 => vec![SHIFT_PERCENT, letter(b'A' + c - 27)],
        b' ' | b'$' | b'%' | b'+' | b'-' | b'.' | b'/' | b'0'..=b'9' | b'A'..=b'Z' => vec![native_value(c)?],
        b'!'..=b',' => vec![SHIFT_SLASH, letter(b'A' + c - b'!')],
        b':' => vec![SHIFT_SLASH, letter(b'Z')],
        b';'..=b'?' => vec![SHIFT_PERCENT, letter(b'F' + c - b';')],
        b'@' => vec![SHIFT_PERCENT, letter(b'V')],
        b'['..=b'_' => vec![SHIFT_PERCENT, letter(b'K' + c - b'[')],
        b'`' => vec![SHIFT_PERCENT, letter(b'W')],
        b'a'..=b'z' => vec![SHIFT_PLUS, letter(b'A' + c - b'a')],
        b'{'..=127 => vec![SHIFT_PERCENT, letter(b'P' + c - b'{')],
        _ => return None,
    };
    Some(values)
}

pub fn encode(payload: &str, _config: &EncodingConfiguration) -> Result<LinearSymbol> {
    if payload.is_empty() {
        return invalid("Code93 payload is empty");
    }
    let mut values = Vec::with_capacity(payload.len() + 2);
    for c in payload.bytes() {
        match full_ascii(c) {
            Some(v) => values.extend(v),
            None => return invalid(format!("{:?} cannot be encoded in Code93", c as char)),
        }
    }
    let check_c = mod47(&values, 20);
    values.push(check_c);
    let check_k = mod47(&values, 15);
    values.push(check_k);
    debug!("Code93 check characters {} {}", check_c, check_k);

    let mut bars = bars_from_bits(START_STOP, 9);
    for &v in &values {
        bars.extend(bars_from_bits(PATTERNS[v as usize], 9));
    }
    bars.extend(bars_from_bits(START_STOP, 9));
    // termination bar
    bars.push(Bar::new(1, true));

    let caption: String = payload.chars().filter(|c| !c.is_control()).collect();
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(caption))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_ascii() {
        assert_eq!(full_ascii(b'a'), Some(vec![SHIFT_PLUS, 10]));
        assert_eq!(full_ascii(b'A'), Some(vec![10]));
        assert_eq!(full_ascii(b'!'), Some(vec![SHIFT_SLASH, 10]));
        assert_eq!(full_ascii(0), Some(vec![SHIFT_PERCENT, 30]));
        assert_eq!(full_ascii(200), None);
    }

    #[test]
    fn test_width() {
        let symbol = encode("TEST93", &EncodingConfiguration::default()).unwrap();
        // start + 6 data + 2 checks + stop, 9 modules each, plus termination bar
        assert_eq!(symbol.symbol_width(), 10 * 9 + 1);
        assert_eq!(symbol.text[0].text, "TEST93");
    }

    #[test]
    fn test_checks() {
        // "TEST93" carries the check characters "+6"
        let values: Vec<u8> = b"TEST93".iter().map(|&c| native_value(c).unwrap()).collect();
        let c = mod47(&values, 20);
        let mut with_c = values.clone();
        with_c.push(c);
        assert_eq!((c, mod47(&with_c, 15)), (41, 6));
    }
}
