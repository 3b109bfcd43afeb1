//! Barcode generation for linear, GS1 DataBar, Japanese postal and 2D symbologies.
//!
//! ```no_run
//! use barcode_gen::{Barcode, Symbology};
//!
//! let mut barcode = Barcode::new(Symbology::Qr);
//! barcode.set_error_correction_level("H");
//! barcode.draw_2d("https://example.com", 200)?;
//! let png = barcode.get_base64();
//! # Ok::<(), barcode_gen::BarcodeError>(())
//! ```

pub use config::{
    Code128Mode, DataBar14Type, DataBarExpandedType, DataMatrixScheme, DataMatrixSize, ECCLevel, Encoding,
    EncodingConfiguration, Family, Field, OutputFormat, Rgba, StringEncoding, Symbology, Version,
};
pub use engine::{encoder_for, Barcode, DrawOutput, State};
pub use error::{BarcodeError, Result};
pub use layout::{Drawing, Rect, TextBox};
pub use symbol::{AbstractSymbol, Encoder, LinearSymbol, MatrixSymbol, PostalSymbol};

pub mod checksum;
pub mod config;
pub mod databar;
pub mod datamatrix;
pub mod engine;
pub mod error;
pub mod layout;
pub mod linear;
pub mod pdf417;
pub mod postal;
pub mod qr;
pub mod raster;
pub mod symbol;
pub mod vector;

mod bitcoding;
mod gs1;
mod rscoding;
mod serialization;
mod tables;
mod text;
