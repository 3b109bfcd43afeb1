use log::debug;

use super::{bars_from_bits, QUIET_ZONE};
use crate::checksum::{complete_mod10, mod103};
use crate::config::{Code128Mode, EncodingConfiguration};
use crate::error::{invalid, Result};
use crate::gs1;
use crate::symbol::{normalize, Bar, LinearSymbol};

/// Module patterns of the values 0-105, eleven modules each.
#[rustfmt::skip]
const PATTERNS: [u16; 106] = [
    0b11011001100, 0b11001101100, 0b11001100110, 0b10010011000, 0b10010001100,
    0b10001001100, 0b10011001000, 0b10011000100, 0b10001100100, 0b11001001000,
    0b11001000100, 0b11000100100, 0b10110011100, 0b10011011100, 0b10011001110,
    0b10111001100, 0b10011101100, 0b10011100110, 0b11001110010, 0b11001011100,
    0b11001001110, 0b11011100100, 0b11001110100, 0b11101101110, 0b11101001100,
    0b11100101100, 0b11100100110, 0b11101100100, 0b11100110100, 0b11100110010,
    0b11011011000, 0b11011000110, 0b11000110110, 0b10100011000, 0b10001011000,
    0b10001000110, 0b10110001000, 0b10001101000, 0b10001100010, 0b11010001000,
    0b11000101000, 0b11000100010, 0b10110111000, 0b10110001110, 0b10001101110,
    0b10111011000, 0b10111000110, 0b10001110110, 0b11101110110, 0b11010001110,
    0b11000101110, 0b11011101000, 0b11011100010, 0b11011101110, 0b11101011000,
    0b11101000110, 0b11100010110, 0b11101101000, 0b11101100010, 0b11100011010,
    0b11101111010, 0b11001000010, 0b11110001010, 0b10100110000, 0b10100001100,
    0b10010110000, 0b10010000110, 0b10000101100, 0b10000100110, 0b10110010000,
    0b10110000100, 0b10011010000, 0b10011000010, 0b10000110100, 0b10000110010,
    0b11000010010, 0b11001010000, 0b11110111010, 0b11000010100, 0b10001111010,
    0b10100111100, 0b10010111100, 0b10010011110, 0b10111100100, 0b10011110100,
    0b10011110010, 0b11110100100, 0b11110010100, 0b11110010010, 0b11011011110,
    0b11011110110, 0b11110110110, 0b10101111000, 0b10100011110, 0b10001011110,
    0b10111101000, 0b10111100010, 0b11110101000, 0b11110100010, 0b10111011110,
    0b10111101110, 0b11101011110, 0b11110101110, 0b11010000100, 0b11010010000,
    0b11010011100,
];

const STOP_PATTERN: u32 = 0b1100011101011;

const CODE_C: u8 = 99;
const CODE_B: u8 = 100;
const CODE_A: u8 = 101;
const FNC1: u8 = 102;
const START_A: u8 = 103;
const START_B: u8 = 104;
const START_C: u8 = 105;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Item {
    Fnc1,
    Char(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

impl CodeSet {
    fn start(self) -> u8 {
        match self {
            CodeSet::A => START_A,
            CodeSet::B => START_B,
            CodeSet::C => START_C,
        }
    }

    fn latch(self) -> u8 {
        match self {
            CodeSet::A => CODE_A,
            CodeSet::B => CODE_B,
            CodeSet::C => CODE_C,
        }
    }

    fn value(self, c: u8) -> Option<u8> {
        match (self, c) {
            (CodeSet::A, 0..=31) => Some(c + 64),
            (CodeSet::A, 32..=95) | (CodeSet::B, 32..=127) => Some(c - 32),
            _ => None,
        }
    }
}

fn items_of(payload: &str) -> Result<Vec<Item>> {
    if !payload.is_ascii() {
        return invalid("Code128 encodes ASCII only");
    }
    Ok(payload.bytes().map(Item::Char).collect())
}

fn digit_run(items: &[Item]) -> usize {
    items.iter().take_while(|it| matches!(it, Item::Char(c) if c.is_ascii_digit())).count()
}

/// A or B for the text starting here: A when a control character shows up before
/// any lower case letter.
fn text_set(items: &[Item]) -> CodeSet {
    for it in items {
        if let Item::Char(c) = *it {
            if c < 32 {
                return CodeSet::A;
            }
            if c >= 96 {
                return CodeSet::B;
            }
        }
    }
    CodeSet::B
}

/// Symbol values from the start character on, without check and stop.
fn auto_values(items: &[Item]) -> Result<Vec<u8>> {
    let first_char = items.iter().position(|it| *it != Item::Fnc1).unwrap_or(items.len());
    let lead_run = digit_run(&items[first_char..]);
    let rest = items.len() - first_char;
    let mut set = if lead_run >= 4 || (lead_run >= 2 && lead_run == rest && lead_run % 2 == 0) {
        CodeSet::C
    } else {
        text_set(items)
    };
    let mut values = vec![set.start()];

    let mut i = 0;
    while i < items.len() {
        let run = digit_run(&items[i..]);
        match items[i] {
            Item::Fnc1 => {
                values.push(FNC1);
                i += 1;
                continue;
            }
            Item::Char(_) if set == CodeSet::C && run >= 2 => {
                values.push(pair_value(&items[i..i + 2]));
                i += 2;
                continue;
            }
            Item::Char(_) if set != CodeSet::C && run >= 4 && run % 2 == 0 => {
                set = CodeSet::C;
                values.push(CODE_C);
                continue;
            }
            Item::Char(c) => {
                if set == CodeSet::C || set.value(c).is_none() {
                    let next = text_set(&items[i..]);
                    // a character the chosen set cannot hold picks the other one
                    set = if next.value(c).is_some() {
                        next
                    } else if next == CodeSet::A {
                        CodeSet::B
                    } else {
                        CodeSet::A
                    };
                    values.push(set.latch());
                }
                match set.value(c) {
                    Some(v) => values.push(v),
                    None => return invalid(format!("{:?} cannot be encoded in Code128", c as char)),
                }
                i += 1;
            }
        }
    }
    Ok(values)
}

fn pair_value(pair: &[Item]) -> u8 {
    match (pair[0], pair[1]) {
        (Item::Char(a), Item::Char(b)) => (a - b'0') * 10 + (b - b'0'),
        _ => 0,
    }
}

fn pinned_values(items: &[Item], set: CodeSet) -> Result<Vec<u8>> {
    let mut values = vec![set.start()];
    let mut i = 0;
    while i < items.len() {
        match items[i] {
            Item::Fnc1 => {
                values.push(FNC1);
                i += 1;
            }
            Item::Char(_) if set == CodeSet::C => {
                if digit_run(&items[i..]) < 2 {
                    return invalid("code set C needs digit pairs");
                }
                values.push(pair_value(&items[i..i + 2]));
                i += 2;
            }
            Item::Char(c) => match set.value(c) {
                Some(v) => {
                    values.push(v);
                    i += 1;
                }
                None => return invalid(format!("{:?} is not in code set {:?}", c as char, set)),
            },
        }
    }
    Ok(values)
}

fn symbol_from_values(mut values: Vec<u8>) -> Vec<Bar> {
    let check = mod103(values[0], &values[1..]);
    values.push(check);
    let mut bars = Vec::with_capacity(values.len() * 6 + 7);
    for &v in &values {
        bars.extend(bars_from_bits(PATTERNS[v as usize] as u32, 11));
    }
    bars.extend(bars_from_bits(STOP_PATTERN, 13));
    normalize(bars)
}

fn encode_items(items: &[Item], mode: Code128Mode) -> Result<Vec<Bar>> {
    if items.iter().all(|it| *it == Item::Fnc1) {
        return invalid("Code128 payload is empty");
    }
    let values = match mode {
        Code128Mode::Auto => auto_values(items)?,
        Code128Mode::A => pinned_values(items, CodeSet::A)?,
        Code128Mode::B => pinned_values(items, CodeSet::B)?,
        Code128Mode::C => pinned_values(items, CodeSet::C)?,
    };
    debug!("Code128 values {:?}", values);
    Ok(symbol_from_values(values))
}

pub fn encode(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let items = items_of(payload)?;
    let bars = encode_items(&items, config.code_mode)?;
    let caption: String = payload.chars().filter(|c| !c.is_control()).collect();
    Ok(LinearSymbol::single_row(bars, QUIET_ZONE).with_caption(caption))
}

fn gs1_items(element_string: &str) -> Vec<Item> {
    std::iter::once(Item::Fnc1)
        .chain(element_string.bytes().map(|b| if b as char == gs1::FNC1 { Item::Fnc1 } else { Item::Char(b) }))
        .collect()
}

/// GS1-128: bracketed AI data, FNC1 after the start character and after every
/// variable length element that is not last.
pub fn encode_gs1(payload: &str, _config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let elements = gs1::parse_bracketed(payload)?;
    let items = gs1_items(&gs1::element_string(&elements));
    let bars = encode_items(&items, Code128Mode::Auto)?;
    Ok(LinearSymbol::single_row(bars, QUIET_ZONE).with_caption(gs1::human_readable(&elements)))
}

/// Digits of a convenience store payment code: AI 91 followed by 41 digits and a
/// mod-10 check digit.
pub fn convenience_digits(payload: &str) -> Result<String> {
    let trimmed = payload.trim();
    let digits = match trimmed.strip_prefix("(91)") {
        Some(rest) => format!("91{}", rest),
        None => trimmed.to_string(),
    };
    if !digits.starts_with("91") {
        return invalid("convenience store codes start with AI 91");
    }
    complete_mod10(&digits, 43)
}

pub fn encode_convenience(payload: &str, _config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let digits = convenience_digits(payload)?;
    let items = gs1_items(&digits);
    let bars = encode_items(&items, Code128Mode::C)?;
    let caption = format!("(91){}", &digits[2..]);
    Ok(LinearSymbol::single_row(bars, QUIET_ZONE).with_caption(caption))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(payload: &str) -> Vec<u8> {
        auto_values(&items_of(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_auto_subsets() {
        assert_eq!(values("1234"), vec![START_C, 12, 34]);
        assert_eq!(values("ABC-12345"), vec![START_B, 33, 34, 35, 13, 17, CODE_C, 23, 45]);
        assert_eq!(values("12345"), vec![START_C, 12, 34, CODE_B, 21]);
        assert_eq!(values("\u{1}A"), vec![START_A, 65, 33]);
        assert_eq!(values("a\u{1}"), vec![START_B, 65, CODE_A, 65]);
    }

    #[test]
    fn test_pinned() {
        let items = items_of("PJJ123C").unwrap();
        let v = pinned_values(&items, CodeSet::B).unwrap();
        assert_eq!(mod103(v[0], &v[1..]), 55);
        assert!(pinned_values(&items_of("123").unwrap(), CodeSet::C).is_err());
        assert!(pinned_values(&items_of("abc").unwrap(), CodeSet::A).is_err());
    }

    #[test]
    fn test_width_and_caption() {
        let symbol = encode("ABC-12345", &EncodingConfiguration::default()).unwrap();
        // 9 symbols + check, 11 modules each, plus the 13 module stop
        assert_eq!(symbol.symbol_width(), 10 * 11 + 13);
        assert_eq!(symbol.text[0].text, "ABC-12345");
        assert!(encode("\u{e9}", &EncodingConfiguration::default()).is_err());
    }

    #[test]
    fn test_gs1_128() {
        let elements = gs1::parse_bracketed("(01)04912345123459").unwrap();
        let items = gs1_items(&gs1::element_string(&elements));
        assert_eq!(auto_values(&items).unwrap(), vec![START_C, FNC1, 1, 4, 91, 23, 45, 12, 34, 59]);

        let symbol = encode_gs1("(01)0491234512345(10)AB1", &EncodingConfiguration::default()).unwrap();
        assert_eq!(symbol.text[0].text, "(01)04912345123459(10)AB1");
        assert!(encode_gs1("01049123451234", &EncodingConfiguration::default()).is_err());
    }

    #[test]
    fn test_convenience() {
        let body = format!("91{}", "1".repeat(41));
        let digits = convenience_digits(&body).unwrap();
        assert_eq!(digits.len(), 44);
        assert_eq!(convenience_digits(&digits).unwrap(), digits);
        assert!(convenience_digits(&format!("92{}", "1".repeat(41))).is_err());

        let symbol = encode_convenience(&body, &EncodingConfiguration::default()).unwrap();
        // start C, FNC1, 22 pairs, check, stop
        assert_eq!(symbol.symbol_width(), 25 * 11 + 13);
    }
}
