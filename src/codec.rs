//! Barcode reading and writing.
//!
//! Decoding turns a picked image into the payload used as a flight code; any
//! symbology the reader knows is accepted, QR and Code 128 included.
//! Encoding produces the Code 128 strip printed on the boarding pass and the
//! QR symbol a ticket carries.

use std::io::Cursor;
use std::path::Path;

use ::image::{DynamicImage, GrayImage, ImageFormat, Luma};
use barcoders::sym::code128::Code128;
use qrcode::QrCode;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Pixel size of the rendered boarding-pass barcode.
pub const BARCODE_WIDTH_PX: u32 = 300;
pub const BARCODE_HEIGHT_PX: u32 = 80;

/// Light modules on each side of the symbol.
const QUIET_ZONE_MODULES: u32 = 10;

/// Code 128 character set B prefix (upper/lower case, digits, punctuation).
const CODE128_SET_B: char = 'Ɓ';

// ============================================================================
// Decode
// ============================================================================

/// Where a scan payload comes from.
#[derive(Debug, Clone)]
pub enum ScanSource {
    /// Text already decoded by an external camera scanner.
    Payload(String),
    /// Image file picked by the user.
    ImageFile(std::path::PathBuf),
}

/// Decode the first readable symbol in the image at `path`.
///
/// # Errors
///
/// [`Error::Image`] when the file cannot be read as an image and
/// [`Error::Decode`] when it holds no readable code.
pub fn decode_image_file(path: &Path) -> Result<String> {
    let img = ::image::open(path)?;
    decode_image(&img)
}

/// Same as [`decode_image_file`] for an in-memory encoded image.
///
/// # Errors
///
/// See [`decode_image_file`].
pub fn decode_image_bytes(bytes: &[u8]) -> Result<String> {
    let img = ::image::load_from_memory(bytes)?;
    decode_image(&img)
}

/// Run `img` through the multi-format reader (hybrid binarizer, every 1D and
/// 2D symbology) and return the text of the first symbol found.
///
/// # Errors
///
/// [`Error::Decode`] when no symbol can be read.
pub fn decode_image(img: &DynamicImage) -> Result<String> {
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();

    match rxing::helpers::detect_in_luma(luma.into_raw(), width, height, None) {
        Ok(result) => {
            let content = result.getText();
            debug!(width, height, format = ?result.getBarcodeFormat(), "decoded symbol");
            if content.trim().is_empty() {
                warn!("symbol decoded to an empty payload");
                return Err(Error::Decode);
            }
            Ok(content.to_string())
        }
        Err(e) => {
            debug!(width, height, error = ?e, "no symbol found");
            Err(Error::Decode)
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Code 128 module pattern for `text`, one entry per module (1 = bar).
///
/// # Errors
///
/// [`Error::Barcode`] when `text` holds characters outside set B.
pub fn barcode_modules(text: &str) -> Result<Vec<u8>> {
    let symbol = Code128::new(format!("{}{}", CODE128_SET_B, text))
        .map_err(|e| Error::Barcode(e.to_string()))?;
    Ok(symbol.encode())
}

/// Render `text` as a black-on-white Code 128 raster of
/// [`BARCODE_WIDTH_PX`] x [`BARCODE_HEIGHT_PX`] (wider if the symbol needs it).
///
/// # Errors
///
/// See [`barcode_modules`].
pub fn generate_barcode_image(text: &str) -> Result<DynamicImage> {
    let modules = barcode_modules(text)?;
    let total_modules = modules.len() as u32 + 2 * QUIET_ZONE_MODULES;
    let module_px = (BARCODE_WIDTH_PX / total_modules).max(1);
    let width = (total_modules * module_px).max(BARCODE_WIDTH_PX);
    let left = (width - total_modules * module_px) / 2 + QUIET_ZONE_MODULES * module_px;

    let mut img = GrayImage::from_pixel(width, BARCODE_HEIGHT_PX, Luma([255u8]));
    for (i, bit) in modules.iter().enumerate() {
        if *bit == 0 {
            continue;
        }
        let x0 = left + i as u32 * module_px;
        for x in x0..x0 + module_px {
            for y in 0..BARCODE_HEIGHT_PX {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }
    Ok(DynamicImage::ImageLuma8(img))
}

/// Render `text` as a QR symbol, the form a ticket's flight code is scanned in.
///
/// # Errors
///
/// [`Error::Barcode`] when the payload does not fit in a QR symbol.
pub fn generate_qr_image(text: &str) -> Result<DynamicImage> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| Error::Barcode(e.to_string()))?;
    let image = code.render::<Luma<u8>>().build();
    Ok(DynamicImage::ImageLuma8(image))
}

/// Serialize an image as PNG for embedding or saving.
///
/// # Errors
///
/// [`Error::Image`] if encoding fails.
pub fn to_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
