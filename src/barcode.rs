//! Barcode encoding and rasterisation.
//!
//! Symbology encoding is delegated to `barcoders`; the resulting module
//! pattern is drawn into a grayscale PNG with the `image` crate. Each image
//! lives in its own in-memory buffer owned by the returned `BarcodeImage`.

use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use log::debug;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use thiserror::Error;

/// Width of a single narrow module, in pixels.
pub const MODULE_WIDTH_PX: u32 = 2;
/// Blank modules on each side of the symbol.
pub const QUIET_ZONE_MODULES: u32 = 10;

/// Selects Code 128 character set B (printable ASCII) in `barcoders`.
const CODE128_SET_B: char = 'Ɓ';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Ean13,
}

impl Symbology {
    pub fn name(&self) -> &'static str {
        match self {
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
            Symbology::Ean13 => "ean13",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown symbology `{0}`")]
pub struct UnknownSymbology(pub String);

impl FromStr for Symbology {
    type Err = UnknownSymbology;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "code128" => Ok(Symbology::Code128),
            "code39" => Ok(Symbology::Code39),
            "ean13" => Ok(Symbology::Ean13),
            _ => Err(UnknownSymbology(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BarcodeError {
    #[error("cannot encode `{value}` as {symbology}: {reason}")]
    Encode {
        symbology: Symbology,
        value: String,
        reason: String,
    },
    #[error("barcode image must have a positive printed size, got {width_mm} x {height_mm} mm")]
    PrintSize { width_mm: f64, height_mm: f64 },
    #[error("failed to write barcode image: {0}")]
    Raster(String),
}

/// Printed size of the barcode picture. The raster keeps this aspect ratio,
/// so the bars come out the same physical height whatever the value length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrintSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

/// A rendered barcode: PNG bytes plus pixel dimensions.
#[derive(Clone, Debug)]
pub struct BarcodeImage {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Encode `value` into a module pattern (1 = bar, 0 = space).
///
/// No checks happen here; whatever the symbology accepts is rendered,
/// including an empty Code 128 value.
pub fn encode(value: &str, symbology: Symbology) -> Result<Vec<u8>, BarcodeError> {
    let encoded = match symbology {
        Symbology::Code128 => Code128::new(format!("{CODE128_SET_B}{value}")).map(|c| c.encode()),
        Symbology::Code39 => Code39::new(value).map(|c| c.encode()),
        Symbology::Ean13 => EAN13::new(value).map(|c| c.encode()),
    };
    encoded.map_err(|e| BarcodeError::Encode {
        symbology,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Draw a module pattern into a PNG, quiet zone included. The pixel height
/// follows the aspect ratio of `size`.
pub fn rasterize(modules: &[u8], size: PrintSize) -> Result<BarcodeImage, BarcodeError> {
    if !(size.width_mm > 0.0 && size.height_mm > 0.0) {
        return Err(BarcodeError::PrintSize {
            width_mm: size.width_mm,
            height_mm: size.height_mm,
        });
    }
    let total_modules = modules.len() as u32 + 2 * QUIET_ZONE_MODULES;
    let width_px = total_modules * MODULE_WIDTH_PX;
    let height_px = ((width_px as f64 * size.height_mm / size.width_mm).round() as u32).max(1);

    let bitmap = GrayImage::from_fn(width_px, height_px, |x, _| {
        let module = x / MODULE_WIDTH_PX;
        let bar = module >= QUIET_ZONE_MODULES
            && modules.get((module - QUIET_ZONE_MODULES) as usize) == Some(&1);
        if bar { Luma([0u8]) } else { Luma([255u8]) }
    });

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(bitmap)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| BarcodeError::Raster(e.to_string()))?;

    Ok(BarcodeImage {
        png,
        width_px,
        height_px,
    })
}

/// Encode and rasterise in one step.
pub fn render(
    value: &str,
    symbology: Symbology,
    size: PrintSize,
) -> Result<BarcodeImage, BarcodeError> {
    let modules = encode(value, symbology)?;
    let image = rasterize(&modules, size)?;
    debug!(
        "Rendered {} barcode `{}` ({}x{} px, {} bytes)",
        symbology,
        value,
        image.width_px,
        image.height_px,
        image.png.len()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_zone_is_blank() {
        let size = PrintSize {
            width_mm: 60.0,
            height_mm: 15.0,
        };
        let image = rasterize(&[1, 0, 1], size).unwrap();
        let decoded = image::load_from_memory(&image.png).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(0, 0), &Luma([255]));
        let first_bar = QUIET_ZONE_MODULES * MODULE_WIDTH_PX;
        assert_eq!(decoded.get_pixel(first_bar, 0), &Luma([0]));
        assert_eq!(decoded.get_pixel(first_bar + MODULE_WIDTH_PX, 0), &Luma([255]));
    }
}
