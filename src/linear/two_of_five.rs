//! The 2 of 5 family: Matrix, NEC and Interleaved. All share the five element
//! digit table with two wide elements per digit.

use super::{bars_from_wide_narrow, QUIET_ZONE};
use crate::checksum::mod10;
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{bars_from_widths, normalize, Bar, LinearSymbol};

/// nnwwn patterns of the digits 0-9, 1 = wide.
const DIGITS: [u32; 10] = [0b00110, 0b10001, 0b01001, 0b11000, 0b00101, 0b10100, 0b01100, 0b00011, 0b10010, 0b01010];

const WIDE: u32 = 3;

fn digits_with_check(payload: &str, config: &EncodingConfiguration, name: &str) -> Result<String> {
    let payload = payload.trim();
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return invalid(format!("{} encodes digits only, got {:?}", name, payload));
    }
    let mut digits = payload.to_string();
    if config.check_digit {
        let check = mod10(&digits)?;
        digits.push((b'0' + check) as char);
    }
    Ok(digits)
}

fn digit(c: u8) -> u32 {
    DIGITS[(c - b'0') as usize]
}

/// Matrix style body: three bars and two spaces per digit, narrow space between.
fn matrix_body(digits: &str) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(digits.len() * 6);
    for c in digits.bytes() {
        bars.extend(bars_from_wide_narrow(digit(c), 5, WIDE));
        bars.push(Bar::new(1, false));
    }
    bars
}

pub fn encode_matrix(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = digits_with_check(payload, config, "Matrix 2 of 5")?;
    let mut bars = bars_from_widths(&[4, 1, 1, 1, 1, 1], true);
    bars.extend(matrix_body(&digits));
    bars.extend(bars_from_widths(&[4, 1, 1, 1, 1], true));
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(digits))
}

pub fn encode_nec(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = digits_with_check(payload, config, "NEC 2 of 5")?;
    let mut bars = bars_from_widths(&[1, 1, 1, 1], true);
    bars.extend(matrix_body(&digits));
    bars.extend(bars_from_widths(&[WIDE, 1, 1], true));
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(digits))
}

/// Interleaved 2 of 5: the first digit of each pair in the bars, the second in
/// the spaces. Odd lengths get a leading zero.
pub fn encode_itf(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let mut digits = digits_with_check(payload, config, "ITF")?;
    if digits.len() % 2 == 1 {
        digits.insert(0, '0');
    }

    let mut bars = bars_from_widths(&[1, 1, 1, 1], true);
    for pair in digits.as_bytes().chunks(2) {
        let (b, s) = (digit(pair[0]), digit(pair[1]));
        for i in (0..5).rev() {
            let width = |p: u32| if (p >> i) & 1 == 1 { WIDE } else { 1 };
            bars.push(Bar::new(width(b), true));
            bars.push(Bar::new(width(s), false));
        }
    }
    bars.extend(bars_from_widths(&[WIDE, 1, 1], true));
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(digits))
}
