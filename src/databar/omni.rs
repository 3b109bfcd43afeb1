use log::debug;

use super::{
    bars_to_modules, group_of, gtin_body, gtin_caption, interleave, modules_to_row, rss_widths, separator_between,
    three_row_separator, widths_to_bars, CharGroup,
};
use crate::config::{DataBar14Type, EncodingConfiguration};
use crate::error::Result;
use crate::symbol::{BarRow, LinearSymbol};

/// Outer characters (16 modules): value = odd * t + even.
const OUTER_GROUPS: [CharGroup; 5] = [
    CharGroup::new(0, 1, (12, 8), (4, 1)),
    CharGroup::new(161, 10, (10, 6), (6, 3)),
    CharGroup::new(961, 34, (8, 4), (8, 5)),
    CharGroup::new(2015, 70, (6, 3), (10, 6)),
    CharGroup::new(2715, 126, (4, 1), (12, 8)),
];

/// Inner characters (15 modules): value = even * t + odd.
const INNER_GROUPS: [CharGroup; 4] = [
    CharGroup::new(0, 4, (5, 2), (10, 7)),
    CharGroup::new(336, 20, (7, 4), (8, 5)),
    CharGroup::new(1036, 48, (9, 6), (6, 3)),
    CharGroup::new(1516, 81, (11, 8), (4, 1)),
];

/// The nine finder patterns, five elements each.
const FINDERS: [[u32; 5]; 9] = [
    [3, 8, 2, 1, 1],
    [3, 5, 5, 1, 1],
    [3, 3, 7, 1, 1],
    [3, 1, 9, 1, 1],
    [2, 7, 4, 1, 1],
    [2, 5, 6, 1, 1],
    [2, 3, 8, 1, 1],
    [1, 5, 7, 1, 1],
    [1, 3, 9, 1, 1],
];

const OUTER_SPLIT: u64 = 4_537_077;
const INNER_SPLIT: u64 = 1597;

fn outer_char(value: u32) -> Vec<u32> {
    let g = group_of(&OUTER_GROUPS, value);
    let v = value - g.sum;
    let odd = rss_widths((v / g.t) as i64, g.odd_modules, 4, g.odd_widest, true);
    let even = rss_widths((v % g.t) as i64, g.even_modules, 4, g.even_widest, false);
    interleave(&odd, &even)
}

fn inner_char(value: u32) -> Vec<u32> {
    let g = group_of(&INNER_GROUPS, value);
    let v = value - g.sum;
    let odd = rss_widths((v % g.t) as i64, g.odd_modules, 4, g.odd_widest, false);
    let even = rss_widths((v / g.t) as i64, g.even_modules, 4, g.even_widest, true);
    interleave(&odd, &even)
}

/// Data character values of a GTIN-13 body: outer, inner, outer, inner.
fn data_characters(body: &str) -> Result<[u32; 4]> {
    let value: u64 = body.parse().map_err(|_| crate::error::BarcodeError::InvalidPayload(body.to_string()))?;
    let (left, right) = (value / OUTER_SPLIT, value % OUTER_SPLIT);
    Ok([
        (left / INNER_SPLIT) as u32,
        (left % INNER_SPLIT) as u32,
        (right / INNER_SPLIT) as u32,
        (right % INNER_SPLIT) as u32,
    ])
}

/// The 46 element widths of the full symbol, guards included, starting with a space.
pub(crate) fn element_widths(body: &str) -> Result<Vec<u32>> {
    let chars = data_characters(body)?;
    let widths = [outer_char(chars[0]), inner_char(chars[1]), outer_char(chars[2]), inner_char(chars[3])];

    // weights 3^k mod 79, eight per character
    let mut checksum = 0u32;
    let mut weight = 1u32;
    for w in widths.iter() {
        for &element in w {
            checksum += weight * element;
            weight = weight * 3 % 79;
        }
    }
    let mut checksum = checksum % 79;
    if checksum >= 8 {
        checksum += 1;
    }
    if checksum >= 72 {
        checksum += 1;
    }
    let (left_finder, right_finder) = ((checksum / 9) as usize, (checksum % 9) as usize);
    debug!("DataBar 14 characters {:?}, finders {} {}", chars, left_finder, right_finder);

    let mut total = Vec::with_capacity(46);
    total.extend_from_slice(&[1, 1]);
    total.extend(widths[0].iter());
    total.extend(FINDERS[left_finder].iter());
    total.extend(widths[1].iter().rev());
    total.extend(widths[3].iter());
    total.extend(FINDERS[right_finder].iter().rev());
    total.extend(widths[2].iter().rev());
    total.extend_from_slice(&[1, 1]);
    Ok(total)
}

pub fn encode(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let body = gtin_body(payload)?;
    let widths = element_widths(&body)?;
    let caption = gtin_caption(&body)?;

    let rows = match config.symbol_type_14 {
        DataBar14Type::Omnidirectional => vec![BarRow { bars: widths_to_bars(&widths, false), height: 33 }],
        DataBar14Type::Stacked | DataBar14Type::StackedOmnidirectional => {
            // top: guard and the left half, closed by a bar and a space
            let mut top = widths_to_bars(&widths[..23], false);
            top.extend(widths_to_bars(&[1, 1], true));
            // bottom: a bar and a space, then the right half
            let mut bottom = widths_to_bars(&[1, 1], true);
            bottom.extend(widths_to_bars(&widths[23..], true));
            let (top, bottom) = (bars_to_modules(&top), bars_to_modules(&bottom));

            if config.symbol_type_14 == DataBar14Type::Stacked {
                vec![
                    modules_to_row(&top, 5),
                    modules_to_row(&separator_between(&top, &bottom), 1),
                    modules_to_row(&bottom, 7),
                ]
            } else {
                let mut rows = vec![modules_to_row(&top, 33)];
                rows.extend(three_row_separator(&top, &bottom));
                rows.push(modules_to_row(&bottom, 33));
                rows
            }
        }
    };

    let mut symbol = LinearSymbol { rows, quiet_left: 0, quiet_right: 0, text: Vec::new() };
    symbol = symbol.with_caption(caption);
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_characters() {
        assert_eq!(data_characters("2001234567890").unwrap(), [276, 312, 1563, 311]);
        assert_eq!(data_characters("0950110153000").unwrap(), [131, 203, 537, 841]);
    }

    #[test]
    fn test_element_widths() {
        let widths = element_widths("2001234567890").unwrap();
        assert_eq!(
            widths,
            vec![
                1, 1, 1, 1, 3, 3, 1, 1, 5, 1, 2, 7, 4, 1, 1, 1, 2, 2, 1, 2, 1, 5, 1, 2, 5, 1, 2, 1, 1, 1, 2, 1, 1, 2, 8,
                3, 3, 2, 1, 2, 1, 2, 3, 2, 1, 1
            ]
        );
        assert_eq!(widths.iter().sum::<u32>(), 96);
    }

    #[test]
    fn test_symbol_types() {
        let symbol = encode("(01)2001234567890", &EncodingConfiguration::default()).unwrap();
        assert_eq!(symbol.rows.len(), 1);
        assert_eq!(symbol.symbol_width(), 96);
        assert_eq!(symbol.text[0].text, "(01)20012345678909");

        let config = EncodingConfiguration { symbol_type_14: DataBar14Type::Stacked, ..Default::default() };
        let symbol = encode("2001234567890", &config).unwrap();
        let heights: Vec<u32> = symbol.rows.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![5, 1, 7]);
        assert_eq!(symbol.symbol_width(), 50);

        let config =
            EncodingConfiguration { symbol_type_14: DataBar14Type::StackedOmnidirectional, ..Default::default() };
        let symbol = encode("2001234567890", &config).unwrap();
        let heights: Vec<u32> = symbol.rows.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![33, 1, 1, 1, 33]);
    }

    #[test]
    fn test_invalid_gtin() {
        assert!(encode("20012345678901", &EncodingConfiguration::default()).is_err());
        assert!(encode("12345", &EncodingConfiguration::default()).is_err());
    }
}
