//! JAN (EAN) and UPC. The digit text is split into segments placed under the
//! symbol halves and, for the outer digits, inside the quiet zones.

use log::debug;

use super::bars_from_bits;
use crate::checksum::{complete_mod10, mod10};
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{normalize, Bar, BarRow, LinearSymbol, TextSegment};

/// Odd parity (L) codes of the digits 0-9, seven modules each.
const L_CODES: [u32; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011, 0b0110111, 0b0001011,
];

/// Parity of the six left hand digits of a JAN-13 symbol, selected by the leading
/// digit. Bit 5 is the first digit, set bits use the G table.
const JAN13_PARITY: [u8; 10] =
    [0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110, 0b011010];

/// Parity of the six UPC-E digits for number system 0, selected by the check
/// digit. Set bits use the G table; number system 1 inverts every bit.
const UPCE_PARITY: [u8; 10] =
    [0b111000, 0b110100, 0b110010, 0b110001, 0b101100, 0b100110, 0b100011, 0b101010, 0b101001, 0b100101];

const NORMAL_GUARD: u32 = 0b101;
const CENTRE_GUARD: u32 = 0b01010;
const UPCE_END_GUARD: u32 = 0b010101;

fn l_code(d: u8) -> u32 {
    L_CODES[d as usize]
}

fn r_code(d: u8) -> u32 {
    !l_code(d) & 0x7F
}

fn g_code(d: u8) -> u32 {
    let r = r_code(d);
    (0..7).fold(0, |acc, i| acc | (((r >> i) & 1) << (6 - i)))
}

fn digit_values(digits: &str) -> Vec<u8> {
    digits.bytes().map(|b| b - b'0').collect()
}

struct ModuleWriter {
    bars: Vec<Bar>,
    guard: bool,
}

impl ModuleWriter {
    fn new(extended_guard: bool) -> ModuleWriter {
        ModuleWriter { bars: Vec::new(), guard: extended_guard }
    }

    fn push(&mut self, bits: u32, len: u32) {
        self.bars.extend(bars_from_bits(bits, len));
    }

    /// Guard pattern, flagged for extension below the bars when extended guards are on.
    fn push_guard(&mut self, bits: u32, len: u32) {
        let guard = self.guard;
        self.bars.extend(bars_from_bits(bits, len).into_iter().map(|mut b| {
            b.guard = guard && b.dark;
            b
        }));
    }

    fn finish(self, quiet_left: u32, quiet_right: u32, text: Vec<TextSegment>) -> LinearSymbol {
        LinearSymbol {
            rows: vec![BarRow { bars: normalize(self.bars), height: 1 }],
            quiet_left,
            quiet_right,
            text,
        }
    }
}

fn segment(text: &str, start: u32, end: u32) -> TextSegment {
    TextSegment { text: text.to_string(), start, end }
}

pub fn encode_jan13(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = complete_mod10(payload, 12)?;
    let d = digit_values(&digits);
    debug!("JAN-13 {}", digits);

    let mut w = ModuleWriter::new(config.extended_guard);
    w.push_guard(NORMAL_GUARD, 3);
    let parity = JAN13_PARITY[d[0] as usize];
    for (i, &digit) in d[1..7].iter().enumerate() {
        let code = if (parity >> (5 - i)) & 1 == 1 { g_code(digit) } else { l_code(digit) };
        w.push(code, 7);
    }
    w.push_guard(CENTRE_GUARD, 5);
    for &digit in &d[7..13] {
        w.push(r_code(digit), 7);
    }
    w.push_guard(NORMAL_GUARD, 3);

    let q = 11;
    let text = vec![
        segment(&digits[..1], 0, q - 1),
        segment(&digits[1..7], q + 3, q + 45),
        segment(&digits[7..], q + 50, q + 92),
    ];
    Ok(w.finish(q, 7, text))
}

pub fn encode_jan8(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = complete_mod10(payload, 7)?;
    let d = digit_values(&digits);

    let mut w = ModuleWriter::new(config.extended_guard);
    w.push_guard(NORMAL_GUARD, 3);
    for &digit in &d[..4] {
        w.push(l_code(digit), 7);
    }
    w.push_guard(CENTRE_GUARD, 5);
    for &digit in &d[4..] {
        w.push(r_code(digit), 7);
    }
    w.push_guard(NORMAL_GUARD, 3);

    let q = 7;
    let text = vec![segment(&digits[..4], q + 3, q + 31), segment(&digits[4..], q + 36, q + 64)];
    Ok(w.finish(q, q, text))
}

pub fn encode_upca(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = complete_mod10(payload, 11)?;
    let d = digit_values(&digits);

    let mut w = ModuleWriter::new(config.extended_guard);
    w.push_guard(NORMAL_GUARD, 3);
    // the number system and check characters are drawn as long as the guards
    w.push_guard(l_code(d[0]), 7);
    for &digit in &d[1..6] {
        w.push(l_code(digit), 7);
    }
    w.push_guard(CENTRE_GUARD, 5);
    for &digit in &d[6..11] {
        w.push(r_code(digit), 7);
    }
    w.push_guard(r_code(d[11]), 7);
    w.push_guard(NORMAL_GUARD, 3);

    let q = 9;
    let text = vec![
        segment(&digits[..1], 0, q - 1),
        segment(&digits[1..6], q + 10, q + 45),
        segment(&digits[6..11], q + 50, q + 85),
        segment(&digits[11..], q + 96, q + 95 + q),
    ];
    Ok(w.finish(q, q, text))
}

/// Expands the number system and six UPC-E digits into the 11 digit UPC-A body.
pub fn expand_upce(ns: u8, d: &[u8]) -> String {
    let s = |range: &[u8]| range.iter().map(|v| (b'0' + v) as char).collect::<String>();
    let body = match d[5] {
        0..=2 => format!("{}{}0000{}", s(&d[..2]), d[5], s(&d[2..5])),
        3 => format!("{}00000{}", s(&d[..3]), s(&d[3..5])),
        4 => format!("{}00000{}", s(&d[..4]), d[4]),
        _ => format!("{}0000{}", s(&d[..5]), d[5]),
    };
    format!("{}{}", ns, body)
}

pub fn encode_upce(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let payload = payload.trim();
    if !payload.bytes().all(|b| b.is_ascii_digit()) {
        return invalid(format!("UPC-E encodes digits only, got {:?}", payload));
    }
    let (ns, body, given_check) = match payload.len() {
        6 => (0, payload, None),
        7 => (payload.as_bytes()[0] - b'0', &payload[1..], None),
        8 => (payload.as_bytes()[0] - b'0', &payload[1..7], Some(payload.as_bytes()[7] - b'0')),
        n => return invalid(format!("UPC-E needs 6, 7 or 8 digits, got {}", n)),
    };
    if ns > 1 {
        return invalid(format!("UPC-E number system must be 0 or 1, got {}", ns));
    }
    let d = digit_values(body);
    let check = mod10(&expand_upce(ns, &d))?;
    if let Some(given) = given_check {
        if given != check {
            return invalid(format!("check digit of {} should be {}", payload, check));
        }
    }

    let mut w = ModuleWriter::new(config.extended_guard);
    w.push_guard(NORMAL_GUARD, 3);
    let parity = if ns == 0 { UPCE_PARITY[check as usize] } else { !UPCE_PARITY[check as usize] & 0x3F };
    for (i, &digit) in d.iter().enumerate() {
        let code = if (parity >> (5 - i)) & 1 == 1 { g_code(digit) } else { l_code(digit) };
        w.push(code, 7);
    }
    w.push_guard(UPCE_END_GUARD, 6);

    let (ql, qr) = (9, 7);
    let ns_text = ns.to_string();
    let check_text = check.to_string();
    let text = vec![
        segment(&ns_text, 0, ql - 1),
        segment(body, ql + 3, ql + 45),
        segment(&check_text, ql + 52, ql + 51 + qr),
    ];
    Ok(w.finish(ql, qr, text))
}
