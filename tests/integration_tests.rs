use barcode_gen::*;
use pretty_assertions::assert_eq;

fn decoded_dimensions(barcode: &Barcode) -> (u32, u32) {
    let img = image::load_from_memory(barcode.image_data().unwrap()).unwrap();
    (img.width(), img.height())
}

#[test]
fn test_qr_png_end_to_end() {
    let mut barcode = Barcode::create(Symbology::Qr.id()).unwrap();
    barcode.set_error_correction_level("H");
    barcode.draw_2d("https://example.com", 200).unwrap();

    let data = barcode.image_data().unwrap();
    assert_eq!(&data[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    assert_eq!(decoded_dimensions(&barcode), (200, 200));

    let img = image::load_from_memory(data).unwrap().to_rgba8();
    // quiet zone in the corner, finder pattern further in
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert!(img.pixels().any(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn test_code128_text_extends_canvas() {
    let mut barcode = Barcode::new(Symbology::Code128);
    barcode.draw_1d("ABC-12345", 300, 100).unwrap();
    let (width, height) = decoded_dimensions(&barcode);
    assert_eq!(width, 300);
    assert!(height > 100);

    barcode.set_show_text(false);
    barcode.draw_1d("ABC-12345", 300, 100).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (300, 100));
}

#[test]
fn test_jan13_check_digit() {
    assert_eq!(checksum::mod10("490123456789"), Ok(4));
    let symbol = match encoder_for(Symbology::Jan13).encode("490123456789", &EncodingConfiguration::default()) {
        Ok(AbstractSymbol::Linear(symbol)) => symbol,
        other => panic!("unexpected {:?}", other),
    };
    let caption: String = symbol.text.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(caption, "4901234567894");

    let mut barcode = Barcode::new(Symbology::Jan13);
    barcode.draw_1d("490123456789", 300, 100).unwrap();
    assert!(barcode.last_draw_succeeded());
}

#[test]
fn test_yubin_width_is_deterministic() {
    let mut barcode = Barcode::new(Symbology::YubinCustomer);
    barcode.draw_postal("1000001-1-2-3", 50).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (1096, 50));
    barcode.draw_postal("2630023-3-2-1-101", 50).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (1096, 50));

    barcode.draw_postal_with_width("1000001", 1200, 50).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (1200, 50));
    assert!(matches!(
        barcode.draw_postal_with_width("1000001", 500, 50),
        Err(BarcodeError::InvalidGeometry(_))
    ));
}

#[test]
fn test_pdf417_fixed_layout_overflow() {
    let mut barcode = Barcode::new(Symbology::Pdf417);
    barcode.set_columns(4);
    barcode.set_rows(10);
    let payload = "A".repeat(100);
    assert!(matches!(barcode.draw_2d_rect(&payload, 600, 300), Err(BarcodeError::PayloadTooLarge(_))));
    assert!(!barcode.last_draw_succeeded());

    barcode.draw_2d_rect(&"A".repeat(30), 600, 300).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (600, 300));
}

#[test]
fn test_too_small_canvas() {
    let mut barcode = Barcode::new(Symbology::Code39);
    assert!(matches!(barcode.draw_1d("CODE39", 1, 1), Err(BarcodeError::InvalidGeometry(_))));
    assert!(matches!(barcode.draw_1d("CODE39", -5, 100), Err(BarcodeError::InvalidGeometry(_))));
    assert_eq!(barcode.get_base64(), "");
    assert_eq!(barcode.output(), Err(BarcodeError::NoResultAvailable));
}

#[test]
fn test_identical_draws_are_identical() {
    let mut first = Barcode::new(Symbology::DataMatrix);
    let mut second = Barcode::new(Symbology::DataMatrix);
    first.draw_2d("Hello, DataMatrix", 150).unwrap();
    second.draw_2d("Hello, DataMatrix", 150).unwrap();
    assert_eq!(first.get_base64(), second.get_base64());

    first.draw_2d("Hello, DataMatrix", 150).unwrap();
    assert_eq!(first.get_base64(), second.get_base64());
}

#[test]
fn test_jpeg_and_svg_outputs() {
    let mut barcode = Barcode::new(Symbology::Itf);
    barcode.set_output_format("jpg");
    barcode.draw_1d("12345678", 300, 80).unwrap();
    assert_eq!(&barcode.image_data().unwrap()[..3], &[0xFF, 0xD8, 0xFF]);

    barcode.set_output_format("svg");
    barcode.draw_1d("12345678", 300, 80).unwrap();
    let svg = barcode.get_vector_markup();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains(">12345678</text>"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<svg").count(), 1);
}

#[test]
fn test_every_symbology_draws() {
    let linear = [
        (Symbology::Code39, "CODE39"),
        (Symbology::Code93, "TEST93"),
        (Symbology::Code128, "Code 128"),
        (Symbology::Gs1_128, "(01)0491234512345(10)AB1"),
        (Symbology::Nw7, "A123A"),
        (Symbology::Matrix2of5, "123"),
        (Symbology::Nec2of5, "123"),
        (Symbology::Jan8, "1234567"),
        (Symbology::Jan13, "490123456789"),
        (Symbology::UpcA, "03600029145"),
        (Symbology::UpcE, "0425261"),
        (Symbology::Itf, "123"),
        (Symbology::DataBar14, "2001234567890"),
        (Symbology::DataBarLimited, "1501234567890"),
        (Symbology::DataBarExpanded, "(01)98898765432106"),
    ];
    for (symbology, payload) in linear.iter() {
        let mut barcode = Barcode::new(*symbology);
        barcode.draw_1d(payload, 600, 120).unwrap_or_else(|e| panic!("{:?}: {}", symbology, e));
        assert!(barcode.get_base64().starts_with("iVBORw0KGgo"), "{:?}", symbology);
    }

    for (symbology, payload) in [(Symbology::Qr, "QR"), (Symbology::DataMatrix, "DM")].iter() {
        let mut barcode = Barcode::new(*symbology);
        barcode.draw_2d(payload, 100).unwrap();
        assert_eq!(decoded_dimensions(&barcode), (100, 100));
    }

    let mut barcode = Barcode::new(Symbology::Pdf417);
    barcode.draw_2d_rect("PDF417", 300, 100).unwrap();
    assert_eq!(decoded_dimensions(&barcode), (300, 100));
}

#[test]
fn test_stacked_and_convenience_draws() {
    let mut barcode = Barcode::new(Symbology::DataBarExpanded);
    barcode.draw_stacked("(01)98898765432106", 400, 200).unwrap();
    // the stacked draw does not change the configured type
    assert_eq!(barcode.configuration().symbol_type_exp, DataBarExpandedType::Unstacked);

    let mut barcode = Barcode::new(Symbology::Gs1_128);
    barcode.draw_convenience(&format!("91{}", "1".repeat(41)), 400, 100).unwrap();
    assert!(barcode.last_draw_succeeded());
    assert!(matches!(
        barcode.draw_convenience(&format!("92{}", "1".repeat(41)), 400, 100),
        Err(BarcodeError::InvalidPayload(_))
    ));
}

#[test]
fn test_qr_byte_capacity_at_40_h() {
    let mut barcode = Barcode::new(Symbology::Qr);
    barcode.set_error_correction_level("H");
    barcode.draw_2d(&"a".repeat(1273), 400).unwrap();
    assert!(matches!(barcode.draw_2d(&"a".repeat(1274), 400), Err(BarcodeError::PayloadTooLarge(_))));
}

#[test]
fn test_dispose() {
    let mut barcode = Barcode::new(Symbology::Qr);
    barcode.draw_2d("A", 100).unwrap();
    barcode.dispose();
    assert_eq!(barcode.state(), State::Disposed);
    assert_eq!(barcode.draw_2d("A", 100), Err(BarcodeError::InvalidHandle));
    assert_eq!(barcode.image_data(), Err(BarcodeError::InvalidHandle));
    assert!(!barcode.last_draw_succeeded());
}

#[test]
fn test_unknown_symbology() {
    assert!(matches!(Barcode::create(19), Err(BarcodeError::UnsupportedSymbology(19))));
    assert!(matches!(Barcode::create(-1), Err(BarcodeError::UnsupportedSymbology(-1))));
}

#[test]
fn test_configuration_from_json() {
    let config: EncodingConfiguration = serde_json::from_str(
        r#"{
            "output_format": "Svg",
            "foreground": [0, 0, 128, 255],
            "error_correction_level": "Q",
            "fit_width": true
        }"#,
    )
    .unwrap();
    assert_eq!(config.error_correction_level, ECCLevel::Q);
    assert_eq!(config.foreground, Rgba([0, 0, 128, 255]));
    assert_eq!(config.y_height, 3);

    let mut barcode = Barcode::new(Symbology::Qr);
    barcode.set_configuration(config);
    barcode.draw_2d("json", 90).unwrap();
    assert!(barcode.is_vector_output());
    assert!(barcode.get_vector_markup().contains("fill=\"#000080\""));
}

fn linear_symbol(symbology: Symbology, payload: &str) -> LinearSymbol {
    match encoder_for(symbology).encode(payload, &EncodingConfiguration::default()) {
        Ok(AbstractSymbol::Linear(symbol)) => symbol,
        other => panic!("unexpected {:?}", other),
    }
}

/// Odd parity digit patterns, as printed in the JAN/UPC tables.
const L_PATTERNS: [&str; 10] =
    ["0001101", "0011001", "0010011", "0111101", "0100011", "0110001", "0101111", "0111011", "0110111", "0001011"];

/// Leading JAN-13 digit by the parity of the left half.
const JAN13_FIRST: [&str; 10] =
    ["LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG", "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL", "LGGLGL"];

/// UPC-E check digit by the parity of its six digits, number system 0.
const UPCE_CHECK: [&str; 10] =
    ["GGGLLL", "GGLGLL", "GGLLGL", "GGLLLG", "GLGGLL", "GLLGGL", "GLLLGG", "GLGLGL", "GLGLLG", "GLLGLG"];

fn module_string(modules: &[bool]) -> String {
    modules.iter().map(|&m| if m { '1' } else { '0' }).collect()
}

/// Reads one seven module character as (digit, parity).
fn read_digit(modules: &str) -> (u8, char) {
    for (d, l) in L_PATTERNS.iter().enumerate() {
        let r: String = l.chars().map(|c| if c == '1' { '0' } else { '1' }).collect();
        let g: String = r.chars().rev().collect();
        if modules == *l {
            return (d as u8, 'L');
        }
        if modules == g {
            return (d as u8, 'G');
        }
        if modules == r {
            return (d as u8, 'R');
        }
    }
    panic!("no digit reads as {}", modules)
}

fn read_half(modules: &str, start: usize, count: usize) -> (String, String) {
    (0..count)
        .map(|i| read_digit(&modules[start + 7 * i..start + 7 * (i + 1)]))
        .map(|(d, parity)| ((b'0' + d) as char, parity))
        .unzip()
}

/// GS1 mod 10 over all digits but the last, weights 3 and 1 from the right.
fn check_digit_of(digits: &str) -> u8 {
    let body = &digits.as_bytes()[..digits.len() - 1];
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, b)| (b - b'0') as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

#[test]
fn test_jan13_reads_back_from_bars() {
    let bars = module_string(&linear_symbol(Symbology::Jan13, "490123456789").row_modules(0));
    assert_eq!(bars.len(), 95);
    assert_eq!((&bars[..3], &bars[45..50], &bars[92..]), ("101", "01010", "101"));
    let (left, parity) = read_half(&bars, 3, 6);
    let (right, right_parity) = read_half(&bars, 50, 6);
    assert_eq!(right_parity, "RRRRRR");
    let first = JAN13_FIRST.iter().position(|p| *p == parity).unwrap();
    let digits = format!("{}{}{}", first, left, right);
    assert_eq!(digits, "4901234567894");
    assert_eq!(check_digit_of(&digits), 4);
}

#[test]
fn test_jan8_reads_back_from_bars() {
    let bars = module_string(&linear_symbol(Symbology::Jan8, "4901234").row_modules(0));
    assert_eq!(bars.len(), 67);
    assert_eq!((&bars[..3], &bars[31..36], &bars[64..]), ("101", "01010", "101"));
    let (left, parity) = read_half(&bars, 3, 4);
    let (right, right_parity) = read_half(&bars, 36, 4);
    assert_eq!((parity.as_str(), right_parity.as_str()), ("LLLL", "RRRR"));
    let digits = format!("{}{}", left, right);
    assert_eq!(digits, "49012347");
    assert_eq!(check_digit_of(&digits), 7);
}

#[test]
fn test_upca_reads_back_from_bars() {
    let bars = module_string(&linear_symbol(Symbology::UpcA, "03600029145").row_modules(0));
    assert_eq!(bars.len(), 95);
    let (left, parity) = read_half(&bars, 3, 6);
    let (right, right_parity) = read_half(&bars, 50, 6);
    assert_eq!((parity.as_str(), right_parity.as_str()), ("LLLLLL", "RRRRRR"));
    let digits = format!("{}{}", left, right);
    assert_eq!(digits, "036000291452");
    assert_eq!(check_digit_of(&digits), 2);
}

#[test]
fn test_upce_reads_back_from_bars() {
    let bars = module_string(&linear_symbol(Symbology::UpcE, "0425261").row_modules(0));
    assert_eq!(bars.len(), 51);
    assert_eq!((&bars[..3], &bars[45..]), ("101", "010101"));
    let (body, parity) = read_half(&bars, 3, 6);
    assert_eq!(body, "425261");
    let check = UPCE_CHECK.iter().position(|p| *p == parity).unwrap() as u8;
    // 425261 expands to the UPC-A body 04210000526
    assert_eq!(check, 4);
    assert_eq!(check_digit_of("042100005264"), check);
}

fn grid_bits(grid: &symbol::ModuleGrid, y: u32, x: u32, len: u32) -> u32 {
    (x..x + len).fold(0, |acc, x| (acc << 1) | grid.get(x, y) as u32)
}

#[test]
fn test_pdf417_rows_use_their_cluster() {
    let symbol = match encoder_for(Symbology::Pdf417).encode("PDF417", &EncodingConfiguration::default()) {
        Ok(AbstractSymbol::Matrix(symbol)) => symbol,
        other => panic!("unexpected {:?}", other),
    };
    let grid = &symbol.grid;
    // start pattern, then the left row indicator 4 in cluster 0
    assert_eq!(grid_bits(grid, 0, 0, 17), 0b1_1111_1110_1010_1000);
    assert_eq!(grid_bits(grid, 0, 17, 17), 0b1_1110_1010_0111_1000);

    let columns = (grid.width - 69) / 17 + 2;
    for y in 0..grid.height {
        for c in 0..columns {
            let bits = grid_bits(grid, y, 17 * (c + 1), 17);
            let mut widths = Vec::new();
            let mut run = 1u32;
            for i in (0..16).rev() {
                if (bits >> i) & 1 == (bits >> (i + 1)) & 1 {
                    run += 1;
                } else {
                    widths.push(run);
                    run = 1;
                }
            }
            widths.push(run);
            assert_eq!(widths.len(), 8, "row {} column {}", y, c);
            assert!(widths.iter().all(|&w| w <= 6));
            let k = (widths[0] + widths[4] + 18 - widths[2] - widths[6]) % 9;
            assert_eq!(k, 3 * (y % 3), "row {} column {}", y, c);
        }
    }
}

#[test]
fn test_huge_text_scale_is_a_geometry_error() {
    let mut barcode = Barcode::new(Symbology::Code128);
    barcode.set_text_font_scale(1e10);
    assert!(matches!(barcode.draw_1d("ABC", 300, 100), Err(BarcodeError::InvalidGeometry(_))));
    assert!(!barcode.last_draw_succeeded());
}

#[test]
fn test_yubin_px_adjust_white() {
    let mut plain = Barcode::new(Symbology::YubinCustomer);
    plain.draw_postal("1000001-1-2-3", 50).unwrap();
    let mut adjusted = Barcode::new(Symbology::YubinCustomer);
    adjusted.set_px_adjust_white(3);
    adjusted.draw_postal("1000001-1-2-3", 50).unwrap();
    // 66 gaps of 3 px more, quiet zones kept
    assert_eq!(decoded_dimensions(&adjusted), (1294, 50));
    assert_ne!(plain.get_base64(), adjusted.get_base64());
}
