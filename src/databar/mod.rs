//! GS1 DataBar: 14 (omnidirectional and stacked), Limited and Expanded.
//!
//! All three build their characters from the same combinatorial width
//! generator: a character value is split into an odd and an even element
//! value, each expanded into element widths with a fixed module sum and a
//! maximum element width.

use crate::config::EncodingConfiguration;
use crate::error::Result;
use crate::gs1;
use crate::symbol::{AbstractSymbol, Bar, BarRow, Encoder};

pub mod expanded;
pub mod limited;
pub mod omni;

/// One row of a character group table.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CharGroup {
    /// First character value of the group.
    pub sum: u32,
    /// Number of element combinations of the side that is taken as remainder.
    pub t: u32,
    pub odd_modules: u32,
    pub even_modules: u32,
    pub odd_widest: u32,
    pub even_widest: u32,
}

impl CharGroup {
    pub const fn new(sum: u32, t: u32, odd: (u32, u32), even: (u32, u32)) -> CharGroup {
        CharGroup { sum, t, odd_modules: odd.0, odd_widest: odd.1, even_modules: even.0, even_widest: even.1 }
    }
}

/// The group a character value falls in.
pub(crate) fn group_of(groups: &[CharGroup], value: u32) -> &CharGroup {
    groups.iter().rev().find(|g| value >= g.sum).unwrap_or(&groups[0])
}

/// Interleaves odd and even element widths into one character, odd first.
pub(crate) fn interleave(odd: &[u32], even: &[u32]) -> Vec<u32> {
    odd.iter().zip(even.iter()).flat_map(|(&o, &e)| vec![o, e]).collect()
}

fn combins(n: i64, r: i64) -> i64 {
    if r < 0 || n < 0 || n < r {
        return 0;
    }
    let r = r.min(n - r);
    (0..r).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Element widths of `value` within all `elements`-tuples summing to `modules`
/// with no element wider than `max_width`. Unless `no_narrow` is set, at least
/// one element is a single module.
pub(crate) fn rss_widths(mut value: i64, modules: u32, elements: usize, max_width: u32, no_narrow: bool) -> Vec<u32> {
    let mut widths = vec![0u32; elements];
    let mut n = modules as i64;
    let max_width = max_width as i64;
    let el = elements as i64;
    let mut narrow_mask = 0u32;

    for bar in 0..elements - 1 {
        let b = bar as i64;
        let mut elm_width = 1i64;
        narrow_mask |= 1 << bar;
        let mut sub_val;
        loop {
            sub_val = combins(n - elm_width - 1, el - b - 2);
            if !no_narrow && narrow_mask == 0 && n - elm_width - (el - b - 1) >= el - b - 1 {
                sub_val -= combins(n - elm_width - (el - b), el - b - 2);
            }
            if el - b - 1 > 1 {
                let mut less_val = 0;
                let mut mxw = n - elm_width - (el - b - 2);
                while mxw > max_width {
                    less_val += combins(n - elm_width - mxw - 1, el - b - 3);
                    mxw -= 1;
                }
                sub_val -= less_val * (el - 1 - b);
            } else if n - elm_width > max_width {
                sub_val -= 1;
            }
            value -= sub_val;
            if value < 0 {
                break;
            }
            elm_width += 1;
            narrow_mask &= !(1 << bar);
        }
        value += sub_val;
        n -= elm_width;
        widths[bar] = elm_width as u32;
    }
    widths[elements - 1] = n as u32;
    widths
}

/// Runs of alternating light/dark elements as bars.
pub(crate) fn widths_to_bars(widths: &[u32], first_dark: bool) -> Vec<Bar> {
    widths.iter().enumerate().map(|(i, &w)| Bar::new(w, (i % 2 == 0) == first_dark)).collect()
}

pub(crate) fn bars_to_modules(bars: &[Bar]) -> Vec<bool> {
    bars.iter().flat_map(|b| std::iter::repeat(b.dark).take(b.modules as usize)).collect()
}

pub(crate) fn modules_to_row(modules: &[bool], height: u32) -> BarRow {
    let mut bars: Vec<Bar> = Vec::new();
    for &m in modules {
        match bars.last_mut() {
            Some(last) if last.dark == m => last.modules += 1,
            _ => bars.push(Bar::new(1, m)),
        }
    }
    BarRow { bars, height }
}

/// Separator between two stacked rows: the complement of the modules above
/// where both rows agree, alternating where they differ.
pub(crate) fn separator_between(top: &[bool], bottom: &[bool]) -> Vec<bool> {
    let width = top.len().max(bottom.len());
    let mut sep = vec![false; width];
    for i in 4..width.saturating_sub(4) {
        let t = top.get(i).copied().unwrap_or(false);
        let b = bottom.get(i).copied().unwrap_or(false);
        sep[i] = if t == b { !t } else { !sep[i - 1] };
    }
    sep
}

/// Separator adjoining one row: its complement, leaving four modules at each end.
pub(crate) fn separator_for(row: &[bool], width: usize) -> Vec<bool> {
    (0..width).map(|i| i >= 4 && i + 4 < row.len() && !row[i]).collect()
}

/// Middle separator row of the omnidirectional stacks.
pub(crate) fn checker_row(width: usize) -> Vec<bool> {
    (0..width).map(|i| i >= 4 && i + 4 < width && i % 2 == 1).collect()
}

/// Three separator rows of height 1 between two omnidirectional rows.
pub(crate) fn three_row_separator(top: &[bool], bottom: &[bool]) -> Vec<BarRow> {
    let width = top.len().max(bottom.len());
    vec![
        modules_to_row(&separator_for(top, width), 1),
        modules_to_row(&checker_row(width), 1),
        modules_to_row(&separator_for(bottom, width), 1),
    ]
}

/// `(01)` element text of a GTIN-13 body and its check digit.
pub(crate) fn gtin_caption(body: &str) -> Result<String> {
    Ok(format!("(01){}{}", body, crate::checksum::mod10(body)?))
}

pub(crate) fn gtin_body(payload: &str) -> Result<String> {
    gs1::gtin13_body(payload)
}

pub struct DataBar14Encoder;

impl Encoder for DataBar14Encoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        omni::encode(payload, config).map(AbstractSymbol::Linear)
    }
}

pub struct DataBarLimitedEncoder;

impl Encoder for DataBarLimitedEncoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        limited::encode(payload, config).map(AbstractSymbol::Linear)
    }
}

pub struct DataBarExpandedEncoder;

impl Encoder for DataBarExpandedEncoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        expanded::encode(payload, config).map(AbstractSymbol::Linear)
    }
}
