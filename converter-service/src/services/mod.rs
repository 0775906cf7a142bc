pub mod converter;

pub use converter::{ConversionError, Converter, LibreOfficeConverter};
