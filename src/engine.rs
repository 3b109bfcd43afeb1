//! The `Barcode` facade: one instance per symbol kind, configured through
//! fire-and-forget setters, drawn through the entry point of its family.
use std::str::FromStr;

use base64::Engine as _;
use log::{debug, warn};

use crate::checksum;
use crate::config::{
    DataBarExpandedType, EncodingConfiguration, Family, Field, OutputFormat, Rgba, Symbology, Version,
};
use crate::databar::{DataBar14Encoder, DataBarExpandedEncoder, DataBarLimitedEncoder};
use crate::datamatrix::DataMatrixEncoder;
use crate::error::{geometry, BarcodeError, Result};
use crate::layout::{self, Drawing};
use crate::linear::{self, code128};
use crate::pdf417::Pdf417Encoder;
use crate::postal::PostalEncoder;
use crate::qr::QrEncoder;
use crate::raster;
use crate::symbol::{AbstractSymbol, Encoder};
use crate::vector;

/// The encoder of each symbology.
pub fn encoder_for(symbology: Symbology) -> &'static dyn Encoder {
    match symbology {
        Symbology::Code39 => &linear::Code39Encoder,
        Symbology::Code93 => &linear::Code93Encoder,
        Symbology::Code128 => &linear::Code128Encoder,
        Symbology::Gs1_128 => &linear::Gs1_128Encoder,
        Symbology::Nw7 => &linear::Nw7Encoder,
        Symbology::Matrix2of5 => &linear::Matrix2of5Encoder,
        Symbology::Nec2of5 => &linear::Nec2of5Encoder,
        Symbology::Jan8 => &linear::Jan8Encoder,
        Symbology::Jan13 => &linear::Jan13Encoder,
        Symbology::UpcA => &linear::UpcAEncoder,
        Symbology::UpcE => &linear::UpcEEncoder,
        Symbology::Itf => &linear::ItfEncoder,
        Symbology::DataBar14 => &DataBar14Encoder,
        Symbology::DataBarLimited => &DataBarLimitedEncoder,
        Symbology::DataBarExpanded => &DataBarExpandedEncoder,
        Symbology::YubinCustomer => &PostalEncoder,
        Symbology::Qr => &QrEncoder,
        Symbology::DataMatrix => &DataMatrixEncoder,
        Symbology::Pdf417 => &Pdf417Encoder,
    }
}

/// Result of a successful draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOutput {
    Raster { format: OutputFormat, width: u32, height: u32, data: Vec<u8> },
    Vector { width: u32, height: u32, markup: String },
}

impl DrawOutput {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DrawOutput::Raster { width, height, .. } | DrawOutput::Vector { width, height, .. } => (*width, *height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Created,
    Configured,
    Drawn,
    Disposed,
}

fn pixels(value: i32, what: &str) -> Result<u32> {
    if value <= 0 {
        return geometry(format!("{} must be positive, got {}", what, value));
    }
    Ok(value as u32)
}

fn render(drawing: Drawing, config: &EncodingConfiguration) -> Result<DrawOutput> {
    let (width, height) = (drawing.width, drawing.height);
    match config.output_format {
        OutputFormat::Svg => Ok(DrawOutput::Vector { width, height, markup: vector::to_svg(&drawing, config) }),
        format => {
            let img = raster::rasterize(&drawing, config);
            let data = raster::encode_image(img, format)?;
            Ok(DrawOutput::Raster { format, width, height, data })
        }
    }
}

fn mismatch(call: &'static str, symbology: Symbology) -> BarcodeError {
    BarcodeError::UnsupportedDrawCall { call, symbology }
}

pub struct Barcode {
    symbology: Symbology,
    config: EncodingConfiguration,
    state: State,
    result: Option<DrawOutput>,
    last_ok: bool,
}

impl Barcode {
    pub fn new(symbology: Symbology) -> Barcode {
        Barcode {
            symbology,
            config: EncodingConfiguration::default(),
            state: State::Created,
            result: None,
            last_ok: false,
        }
    }

    /// Creates an instance from the integer symbology id (0 to 18).
    pub fn create(type_id: i32) -> Result<Barcode> {
        Symbology::from_id(type_id).map(Barcode::new)
    }

    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn configuration(&self) -> &EncodingConfiguration {
        &self.config
    }

    /// Replaces every option at once, e.g. with a set loaded from JSON.
    pub fn set_configuration(&mut self, config: EncodingConfiguration) {
        if self.state == State::Disposed {
            debug!("configuration ignored on a disposed barcode");
            return;
        }
        self.config = config;
        self.state = State::Configured;
    }

    fn update<F>(&mut self, field: Field, name: &str, apply: F)
    where
        F: FnOnce(&mut EncodingConfiguration) -> bool,
    {
        if self.state == State::Disposed {
            debug!("{} ignored on a disposed barcode", name);
            return;
        }
        if !self.symbology.accepts(field) {
            debug!("{} does not apply to {:?}", name, self.symbology);
            return;
        }
        if apply(&mut self.config) {
            self.state = State::Configured;
        } else {
            debug!("ignored invalid {} value", name);
        }
    }

    fn update_parsed<T, F>(&mut self, field: Field, name: &str, value: &str, apply: F)
    where
        T: FromStr,
        F: FnOnce(&mut EncodingConfiguration, T),
    {
        self.update(field, name, |config| match value.parse::<T>() {
            Ok(parsed) => {
                apply(config, parsed);
                true
            }
            Err(_) => false,
        })
    }

    //---------------------------------------------------------------------------------------------
    // setters

    pub fn set_output_format(&mut self, format: &str) {
        self.update_parsed(Field::OutputFormat, "output format", format, |c, v| c.output_format = v);
    }

    pub fn set_foreground_color(&mut self, r: i32, g: i32, b: i32, a: i32) {
        self.update(Field::Colors, "foreground color", |c| match Rgba::from_components(r, g, b, a) {
            Some(color) => {
                c.foreground = color;
                true
            }
            None => false,
        });
    }

    pub fn set_background_color(&mut self, r: i32, g: i32, b: i32, a: i32) {
        self.update(Field::Colors, "background color", |c| match Rgba::from_components(r, g, b, a) {
            Some(color) => {
                c.background = color;
                true
            }
            None => false,
        });
    }

    pub fn set_px_adjust_black(&mut self, px: i32) {
        self.update(Field::PixelAdjust, "px adjust black", |c| {
            c.px_adjust_black = px;
            true
        });
    }

    pub fn set_px_adjust_white(&mut self, px: i32) {
        self.update(Field::PixelAdjust, "px adjust white", |c| {
            c.px_adjust_white = px;
            true
        });
    }

    pub fn set_fit_width(&mut self, fit: bool) {
        self.update(Field::FitWidth, "fit width", |c| {
            c.fit_width = fit;
            true
        });
    }

    pub fn set_show_text(&mut self, show: bool) {
        self.update(Field::Text, "show text", |c| {
            c.show_text = show;
            true
        });
    }

    pub fn set_text_font_scale(&mut self, scale: f64) {
        self.update(Field::Text, "text font scale", |c| {
            let ok = scale.is_finite() && scale > 0.0;
            if ok {
                c.text_font_scale = scale;
            }
            ok
        });
    }

    pub fn set_text_gap(&mut self, gap: f64) {
        self.update(Field::Text, "text gap", |c| {
            let ok = gap.is_finite() && gap >= 0.0;
            if ok {
                c.text_gap = gap;
            }
            ok
        });
    }

    pub fn set_text_even_spacing(&mut self, even: bool) {
        self.update(Field::Text, "text even spacing", |c| {
            c.text_even_spacing = even;
            true
        });
    }

    pub fn set_show_start_stop(&mut self, show: bool) {
        self.update(Field::ShowStartStop, "show start/stop", |c| {
            c.show_start_stop = show;
            true
        });
    }

    pub fn set_code_mode(&mut self, mode: &str) {
        self.update_parsed(Field::CodeMode, "code mode", mode, |c, v| c.code_mode = v);
    }

    pub fn set_extended_guard(&mut self, extended: bool) {
        self.update(Field::ExtendedGuard, "extended guard", |c| {
            c.extended_guard = extended;
            true
        });
    }

    pub fn set_check_digit(&mut self, check: bool) {
        self.update(Field::CheckDigit, "check digit", |c| {
            c.check_digit = check;
            true
        });
    }

    pub fn set_string_encoding(&mut self, encoding: &str) {
        self.update_parsed(Field::StringEncoding, "string encoding", encoding, |c, v| c.string_encoding = v);
    }

    pub fn set_error_correction_level(&mut self, level: &str) {
        self.update_parsed(Field::Qr, "error correction level", level, |c, v| c.error_correction_level = v);
    }

    /// QR version 1 to 40, 0 for automatic.
    pub fn set_version(&mut self, version: i32) {
        self.update(Field::Qr, "version", |c| match version {
            0 => {
                c.version = None;
                true
            }
            1..=40 => {
                c.version = Version::new(version as u8);
                true
            }
            _ => false,
        });
    }

    /// QR encode mode; "AUTO" picks the narrowest mode for the payload.
    pub fn set_encode_mode(&mut self, mode: &str) {
        if mode.trim().eq_ignore_ascii_case("auto") {
            self.update(Field::Qr, "encode mode", |c| {
                c.encode_mode = None;
                true
            });
        } else {
            self.update_parsed(Field::Qr, "encode mode", mode, |c, v| c.encode_mode = Some(v));
        }
    }

    pub fn set_code_size(&mut self, size: &str) {
        self.update_parsed(Field::DataMatrix, "code size", size, |c, v| c.code_size = v);
    }

    pub fn set_encode_scheme(&mut self, scheme: &str) {
        self.update_parsed(Field::DataMatrix, "encode scheme", scheme, |c, v| c.encode_scheme = v);
    }

    /// PDF417 error correction level 0 to 8, -1 for automatic.
    pub fn set_error_level(&mut self, level: i32) {
        self.update(Field::Pdf417, "error level", |c| match level {
            -1 => {
                c.error_level = None;
                true
            }
            0..=8 => {
                c.error_level = Some(level as u8);
                true
            }
            _ => false,
        });
    }

    /// PDF417 data columns 1 to 30, 0 for automatic.
    pub fn set_columns(&mut self, columns: i32) {
        self.update(Field::Pdf417, "columns", |c| {
            let ok = (0..=30).contains(&columns);
            if ok {
                c.columns = columns as u32;
            }
            ok
        });
    }

    /// PDF417 rows 3 to 90, 0 for automatic.
    pub fn set_rows(&mut self, rows: i32) {
        self.update(Field::Pdf417, "rows", |c| {
            let ok = rows == 0 || (3..=90).contains(&rows);
            if ok {
                c.rows = rows as u32;
            }
            ok
        });
    }

    pub fn set_aspect_ratio(&mut self, ratio: f64) {
        self.update(Field::Pdf417, "aspect ratio", |c| {
            let ok = ratio.is_finite() && ratio > 0.0;
            if ok {
                c.aspect_ratio = ratio;
            }
            ok
        });
    }

    pub fn set_y_height(&mut self, y_height: i32) {
        self.update(Field::Pdf417, "y height", |c| {
            let ok = y_height >= 1;
            if ok {
                c.y_height = y_height as u32;
            }
            ok
        });
    }

    pub fn set_symbol_type_14(&mut self, symbol_type: &str) {
        self.update_parsed(Field::DataBar14, "symbol type", symbol_type, |c, v| c.symbol_type_14 = v);
    }

    pub fn set_symbol_type_exp(&mut self, symbol_type: &str) {
        self.update_parsed(Field::DataBarExpanded, "symbol type", symbol_type, |c, v| c.symbol_type_exp = v);
    }

    /// Segment pairs per row of stacked DataBar Expanded.
    pub fn set_no_of_columns(&mut self, columns: i32) {
        self.update(Field::DataBarExpanded, "number of columns", |c| {
            let ok = (1..=11).contains(&columns);
            if ok {
                c.no_of_columns = columns as u32;
            }
            ok
        });
    }

    pub fn get_symbol_type_14(&self) -> &'static str {
        self.config.symbol_type_14.as_str()
    }

    /// GS1 check digit of a 13 digit GTIN body.
    pub fn calculate_check_digit_14(&self, src: &str) -> Result<u8> {
        checksum::gs1_check_digit(src)
    }

    //---------------------------------------------------------------------------------------------
    // drawing

    fn run_draw<F>(&mut self, call: &'static str, supported: bool, draw: F) -> Result<()>
    where
        F: FnOnce(&EncodingConfiguration) -> Result<DrawOutput>,
    {
        if self.state == State::Disposed {
            return Err(BarcodeError::InvalidHandle);
        }
        let outcome = if supported { draw(&self.config) } else { Err(mismatch(call, self.symbology)) };
        match outcome {
            Ok(output) => {
                debug!("{} drew {:?} at {:?}", call, self.symbology, output.dimensions());
                self.result = Some(output);
                self.last_ok = true;
                self.state = State::Drawn;
                Ok(())
            }
            Err(err) => {
                warn!("{} failed for {:?}: {}", call, self.symbology, err);
                self.result = None;
                self.last_ok = false;
                Err(err)
            }
        }
    }

    fn draw_linear_with(
        &mut self,
        call: &'static str,
        supported: bool,
        code: &str,
        width: i32,
        height: i32,
        encode: impl FnOnce(&str, &EncodingConfiguration) -> Result<AbstractSymbol>,
    ) -> Result<()> {
        let symbology = self.symbology;
        self.run_draw(call, supported, |config| {
            let (width, height) = (pixels(width, "width")?, pixels(height, "height")?);
            match encode(code, config)? {
                AbstractSymbol::Linear(symbol) => {
                    render(layout::layout_linear(&symbol, width, height, config)?, config)
                }
                _ => Err(mismatch(call, symbology)),
            }
        })
    }

    /// Draws a linear or DataBar symbol with bars `height` pixels high.
    pub fn draw_1d(&mut self, code: &str, width: i32, height: i32) -> Result<()> {
        let symbology = self.symbology;
        let supported = matches!(symbology.family(), Family::Linear | Family::DataBar);
        self.draw_linear_with("draw_1d", supported, code, width, height, |code, config| {
            encoder_for(symbology).encode(code, config)
        })
    }

    /// Draws DataBar Expanded in its stacked form whatever the configured type.
    pub fn draw_stacked(&mut self, code: &str, width: i32, height: i32) -> Result<()> {
        let supported = self.symbology == Symbology::DataBarExpanded;
        self.draw_linear_with("draw_stacked", supported, code, width, height, |code, config| {
            let stacked = EncodingConfiguration { symbol_type_exp: DataBarExpandedType::Stacked, ..config.clone() };
            DataBarExpandedEncoder.encode(code, &stacked)
        })
    }

    /// Draws the GS1-128 convenience store payment code: AI (91) and 43 or 44 digits.
    pub fn draw_convenience(&mut self, code: &str, width: i32, height: i32) -> Result<()> {
        let supported = self.symbology == Symbology::Gs1_128;
        self.draw_linear_with("draw_convenience", supported, code, width, height, |code, config| {
            code128::encode_convenience(code, config).map(AbstractSymbol::Linear)
        })
    }

    fn draw_matrix(&mut self, call: &'static str, supported: bool, code: &str, width: i32, height: i32) -> Result<()> {
        let symbology = self.symbology;
        self.run_draw(call, supported, |config| {
            let (width, height) = (pixels(width, "width")?, pixels(height, "height")?);
            match encoder_for(symbology).encode(code, config)? {
                AbstractSymbol::Matrix(symbol) => {
                    render(layout::layout_matrix(&symbol, width, height, config)?, config)
                }
                _ => Err(mismatch(call, symbology)),
            }
        })
    }

    /// Draws a QR or DataMatrix symbol on a `size` x `size` canvas.
    pub fn draw_2d(&mut self, code: &str, size: i32) -> Result<()> {
        let supported = matches!(self.symbology, Symbology::Qr | Symbology::DataMatrix);
        self.draw_matrix("draw_2d", supported, code, size, size)
    }

    /// Draws any 2D symbol on a `width` x `height` canvas.
    pub fn draw_2d_rect(&mut self, code: &str, width: i32, height: i32) -> Result<()> {
        let supported = self.symbology.family() == Family::Matrix;
        self.draw_matrix("draw_2d_rect", supported, code, width, height)
    }

    fn draw_postal_inner(&mut self, call: &'static str, code: &str, width: Option<i32>, height: i32) -> Result<()> {
        let symbology = self.symbology;
        let supported = symbology.family() == Family::Postal;
        self.run_draw(call, supported, |config| {
            let height = pixels(height, "height")?;
            let width = match width {
                Some(w) => Some(pixels(w, "width")?),
                None => None,
            };
            match encoder_for(symbology).encode(code, config)? {
                AbstractSymbol::Postal(symbol) => {
                    render(layout::layout_postal(&symbol, width, height, config)?, config)
                }
                _ => Err(mismatch(call, symbology)),
            }
        })
    }

    /// Draws the customer barcode `height` pixels high, as wide as it needs.
    pub fn draw_postal(&mut self, code: &str, height: i32) -> Result<()> {
        self.draw_postal_inner("draw_postal", code, None, height)
    }

    pub fn draw_postal_with_width(&mut self, code: &str, width: i32, height: i32) -> Result<()> {
        self.draw_postal_inner("draw_postal_with_width", code, Some(width), height)
    }

    //---------------------------------------------------------------------------------------------
    // results

    pub fn last_draw_succeeded(&self) -> bool {
        self.state != State::Disposed && self.last_ok
    }

    pub fn output(&self) -> Result<&DrawOutput> {
        if self.state == State::Disposed {
            return Err(BarcodeError::InvalidHandle);
        }
        self.result.as_ref().ok_or(BarcodeError::NoResultAvailable)
    }

    pub fn is_vector_output(&self) -> bool {
        matches!(self.output(), Ok(DrawOutput::Vector { .. }))
    }

    /// Base64 of the last raster image, empty without one.
    pub fn get_base64(&self) -> String {
        match self.output() {
            Ok(DrawOutput::Raster { data, .. }) => base64::engine::general_purpose::STANDARD.encode(data),
            _ => String::new(),
        }
    }

    /// SVG markup of the last vector result, empty without one.
    pub fn get_vector_markup(&self) -> String {
        match self.output() {
            Ok(DrawOutput::Vector { markup, .. }) => markup.clone(),
            _ => String::new(),
        }
    }

    /// Raw PNG or JPEG bytes of the last raster result.
    pub fn image_data(&self) -> Result<&[u8]> {
        match self.output()? {
            DrawOutput::Raster { data, .. } => Ok(data),
            DrawOutput::Vector { .. } => Err(BarcodeError::NoResultAvailable),
        }
    }

    /// Releases the result; every later draw or result call fails with `InvalidHandle`.
    pub fn dispose(&mut self) {
        self.result = None;
        self.last_ok = false;
        self.state = State::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Code128Mode, DataBar14Type, ECCLevel};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_symbology_has_an_encoder() {
        // the dispatch table and the family of every symbology agree
        let samples = [
            (Symbology::Code39, "ABC"),
            (Symbology::Jan13, "490123456789"),
            (Symbology::DataBarLimited, "1501234567890"),
            (Symbology::YubinCustomer, "1000001"),
            (Symbology::Qr, "A"),
            (Symbology::Pdf417, "A"),
        ];
        for (symbology, payload) in samples.iter() {
            let symbol = encoder_for(*symbology).encode(payload, &EncodingConfiguration::default()).unwrap();
            let family = match symbol {
                AbstractSymbol::Linear(_) => vec![Family::Linear, Family::DataBar],
                AbstractSymbol::Matrix(_) => vec![Family::Matrix],
                AbstractSymbol::Postal(_) => vec![Family::Postal],
            };
            assert!(family.contains(&symbology.family()), "{:?}", symbology);
        }
    }

    #[test]
    fn test_state_machine() {
        let mut barcode = Barcode::new(Symbology::Code128);
        assert_eq!(barcode.state(), State::Created);
        assert_eq!(barcode.output(), Err(BarcodeError::NoResultAvailable));
        barcode.set_code_mode("B");
        assert_eq!(barcode.state(), State::Configured);
        barcode.draw_1d("ABC", 300, 100).unwrap();
        assert_eq!(barcode.state(), State::Drawn);
        assert!(barcode.last_draw_succeeded());

        // a failed draw clears the previous result
        assert!(barcode.draw_1d("ABC", 1, 1).is_err());
        assert!(!barcode.last_draw_succeeded());
        assert_eq!(barcode.output(), Err(BarcodeError::NoResultAvailable));

        barcode.dispose();
        assert_eq!(barcode.draw_1d("ABC", 300, 100), Err(BarcodeError::InvalidHandle));
        assert_eq!(barcode.output(), Err(BarcodeError::InvalidHandle));
        assert_eq!(barcode.get_base64(), "");
        barcode.set_code_mode("C");
        assert_eq!(barcode.configuration().code_mode, Code128Mode::B);
    }

    #[test]
    fn test_setters_ignore_bad_values() {
        let mut barcode = Barcode::new(Symbology::Qr);
        barcode.set_error_correction_level("Z");
        barcode.set_version(41);
        barcode.set_output_format("gif");
        barcode.set_foreground_color(0, 0, 0, 300);
        assert_eq!(barcode.configuration(), &EncodingConfiguration::default());
        assert_eq!(barcode.state(), State::Created);

        barcode.set_error_correction_level("h");
        barcode.set_version(5);
        barcode.set_encode_mode("alphanumeric");
        assert_eq!(barcode.configuration().error_correction_level, ECCLevel::H);
        assert_eq!(barcode.configuration().version, Version::new(5));
        barcode.set_encode_mode("AUTO");
        assert_eq!(barcode.configuration().encode_mode, None);

        // options of other symbologies are not taken
        barcode.set_columns(4);
        assert_eq!(barcode.configuration().columns, 0);
    }

    #[test]
    fn test_draw_call_mismatch() {
        let mut barcode = Barcode::new(Symbology::Qr);
        assert_eq!(
            barcode.draw_1d("A", 100, 100),
            Err(BarcodeError::UnsupportedDrawCall { call: "draw_1d", symbology: Symbology::Qr })
        );
        let mut barcode = Barcode::new(Symbology::Pdf417);
        assert!(matches!(barcode.draw_2d("A", 100), Err(BarcodeError::UnsupportedDrawCall { .. })));
        assert!(barcode.draw_2d_rect("A", 300, 100).is_ok());
        let mut barcode = Barcode::new(Symbology::Code128);
        assert!(matches!(barcode.draw_stacked("A", 100, 100), Err(BarcodeError::UnsupportedDrawCall { .. })));
        assert!(matches!(barcode.draw_postal("1000001", 50), Err(BarcodeError::UnsupportedDrawCall { .. })));
    }

    #[test]
    fn test_databar_14_helpers() {
        let mut barcode = Barcode::new(Symbology::DataBar14);
        assert_eq!(barcode.get_symbol_type_14(), "OMNIDIRECTIONAL");
        barcode.set_symbol_type_14("stacked");
        assert_eq!(barcode.configuration().symbol_type_14, DataBar14Type::Stacked);
        assert_eq!(barcode.get_symbol_type_14(), "STACKED");
        assert_eq!(barcode.calculate_check_digit_14("2001234567890"), Ok(9));
    }

    #[test]
    fn test_vector_and_raster_results() {
        let mut barcode = Barcode::new(Symbology::Qr);
        barcode.set_output_format("svg");
        barcode.draw_2d("hello", 120).unwrap();
        assert!(barcode.is_vector_output());
        assert!(barcode.get_vector_markup().contains("<svg"));
        assert_eq!(barcode.get_base64(), "");
        assert_eq!(barcode.image_data(), Err(BarcodeError::NoResultAvailable));

        barcode.set_output_format("png");
        barcode.draw_2d("hello", 120).unwrap();
        assert!(!barcode.is_vector_output());
        assert_eq!(barcode.get_vector_markup(), "");
        assert!(barcode.get_base64().starts_with("iVBORw0KGgo"));
        assert_eq!(&barcode.image_data().unwrap()[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }
}
