use super::*;

use image;

/// Return the masking function for a given pattern index in 0..8. Returns a function
/// that returns for the given index i,j (i row coord, j column coord, including the
/// quiet region!) whether it meets the masking condition.
fn get_masking_function(pattern_index: u8) -> Box<dyn Fn(i32, i32) -> bool> {
    match pattern_index & 0b111 {
        0b000 => Box::new(|i, j| ((i - 4) + (j - 4)) % 2 == 0),
        0b001 => Box::new(|i, _j| (i - 4) % 2 == 0),
        0b010 => Box::new(|_i, j| (j - 4) % 3 == 0),
        0b011 => Box::new(|i, j| ((i - 4) + (j - 4)) % 3 == 0),
        0b100 => Box::new(|i, j| ((i - 4) / 2 + (j - 4) / 3) % 2 == 0),
        0b101 => Box::new(|i, j| ((i - 4) * (j - 4)) % 2 + ((i - 4) * (j - 4)) % 3 == 0),
        0b110 => Box::new(|i, j| (((i - 4) * (j - 4)) % 2 + ((i - 4) * (j - 4)) % 3) % 2 == 0),
        _ => Box::new(|i, j| (((i - 4) + (j - 4)) % 2 + ((i - 4) * (j - 4)) % 3) % 2 == 0),
    }
}

/// apply mask to given symbol's encoding region. The last parameter is the canvas
/// without content, to mark the encoding region inside the symbol.
pub fn apply_mask(symbol: &mut image::GrayImage, pattern: u8, marker: &image::GrayImage) {
    let pattern_func = get_masking_function(pattern);

    for (x, y, pix) in symbol.enumerate_pixels_mut() {
        // only the encoding region is masked. Flipping a bit where the mask
        // bit is 1 is a XOR between mask and value.
        if marker[(x, y)] == MARKER_ENCODING_REGION && pattern_func(y as i32, x as i32) {
            *pix = if *pix == BIT_BLACK { BIT_WHITE } else { BIT_BLACK };
        }
    }
}

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

// dark-light-dark-dark-dark-light-dark with four light modules on one side
const FINDER_LIKE_LEFT: [bool; 11] = [false, false, false, false, true, false, true, true, true, false, true];
const FINDER_LIKE_RIGHT: [bool; 11] = [true, false, true, true, true, false, true, false, false, false, false];

/// Penalties of the first and third kind for a single row or column.
fn line_penalty(line: &[bool]) -> u32 {
    let mut score = 0;

    // runs of five or more modules of the same colour
    let mut run = 1;
    for k in 1..=line.len() {
        if k < line.len() && line[k] == line[k - 1] {
            run += 1;
        } else {
            if run >= 5 {
                score += PENALTY_N1 + (run - 5);
            }
            run = 1;
        }
    }

    // finder-like patterns; the light area outside the symbol counts as light
    let mut padded = vec![false; 4];
    padded.extend_from_slice(line);
    padded.extend_from_slice(&[false; 4]);
    for window in padded.windows(11) {
        if window == FINDER_LIKE_LEFT || window == FINDER_LIKE_RIGHT {
            score += PENALTY_N3;
        }
    }

    score
}

/// Compute penalty score for a symbol with mask and format information applied.
fn compute_mask_penalty_score(masked_symbol: &image::GrayImage) -> u32 {
    // all iterations exclude the quiet region, which accounts for the offset of 4.
    let size = masked_symbol.width() - 8;
    let dark = |x: u32, y: u32| masked_symbol[(x + 4, y + 4)] == BIT_BLACK;
    let mut score = 0;

    // FIRST and THIRD feature, rows then columns
    for a in 0..size {
        let row: Vec<bool> = (0..size).map(|b| dark(b, a)).collect();
        let column: Vec<bool> = (0..size).map(|b| dark(a, b)).collect();
        score += line_penalty(&row) + line_penalty(&column);
    }

    // SECOND feature: 2x2 module blocks of same color
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let c = dark(x, y);
            if c == dark(x + 1, y) && c == dark(x, y + 1) && c == dark(x + 1, y + 1) {
                score += PENALTY_N2;
            }
        }
    }

    // FOURTH feature: dark/light ratio balance, in full 5% steps away from 50%
    let total = (size * size) as i64;
    let num_dark = (0..size).flat_map(|y| (0..size).map(move |x| (x, y))).filter(|&(x, y)| dark(x, y)).count() as i64;
    let step = (num_dark * 20 - total * 10).abs() / total;
    score += PENALTY_N4 * step as u32;

    score
}

/// Compute best mask and apply it.
/// Will evaluate all eight masks for the given symbol, with the matching format
/// information written in, and return the code of the best mask and the resulting
/// masked symbol. On a tie the lowest mask index wins.
pub fn apply_best_mask(unmasked_symbol: &image::GrayImage, version: Version, ecl: ECCLevel) -> (u8, image::GrayImage) {
    let canvas = create_qr_canvas(version);
    let mut best: Option<(u8, image::GrayImage, u32)> = None;
    for index in 0..8u8 {
        let mut masked_copy = unmasked_symbol.clone();
        apply_mask(&mut masked_copy, index, &canvas);
        insert_format_info(&mut masked_copy, version, ecl, index);
        let score = compute_mask_penalty_score(&masked_copy);
        log::trace!("mask {} scores {}", index, score);
        if best.as_ref().map_or(true, |(_, _, best_score)| score < *best_score) {
            best = Some((index, masked_copy, score));
        }
    }
    match best {
        Some((index, symbol, _)) => (index, symbol),
        None => (0, unmasked_symbol.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_masked_canvas(version: Version, pattern_index: u8) -> image::GrayImage {
        let mut canvas = create_qr_canvas(version);
        let pattern = get_masking_function(pattern_index);
        for (x, y, pix) in canvas.enumerate_pixels_mut() {
            if *pix == MARKER_ENCODING_REGION {
                *pix = if pattern(y as i32, x as i32) { BIT_BLACK } else { BIT_WHITE };
            }
        }
        canvas
    }

    #[test]
    fn test_masks_standard() {
        let version = Version::new(1).unwrap();
        // mask 1 darkens every even row of the encoding region
        let canvas = create_masked_canvas(version, 1);
        assert_eq!(canvas[(4 + 20, 4 + 20)], BIT_BLACK);
        assert_eq!(canvas[(4 + 20, 4 + 19)], BIT_WHITE);
        // mask 2 darkens every third column
        let canvas = create_masked_canvas(version, 2);
        assert_eq!(canvas[(4 + 18, 4 + 20)], BIT_BLACK);
        assert_eq!(canvas[(4 + 20, 4 + 20)], BIT_WHITE);
    }

    #[test]
    fn test_line_penalty() {
        // a run of 6 costs 3 + 1
        assert_eq!(line_penalty(&[true, true, true, true, true, true, false]), 4);
        // finder-like pattern at the edge, light outside the symbol
        let line = [true, false, true, true, true, false, true, false, true, false, true, false];
        assert_eq!(line_penalty(&line), PENALTY_N3);
    }

    #[test]
    fn test_best_mask_is_deterministic() {
        let version = Version::new(1).unwrap();
        let mut canvas = create_qr_canvas(version);
        insert_data_payload(&mut canvas, version, &[0x55; 26]).unwrap();
        let (first, a) = apply_best_mask(&canvas, version, ECCLevel::M);
        let (second, b) = apply_best_mask(&canvas, version, ECCLevel::M);
        assert_eq!(first, second);
        assert_eq!(a, b);
        assert!(first < 8);
        let mut masked = canvas.clone();
        apply_mask(&mut masked, first, &create_qr_canvas(version));
        insert_format_info(&mut masked, version, ECCLevel::M, first);
        assert_eq!(a, masked);
    }
}
