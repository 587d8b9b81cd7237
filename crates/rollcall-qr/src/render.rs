//! Symbol rendering.

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::error::QrError;

/// Render an encoded payload string as an SVG symbol.
///
/// Error correction is fixed at level M — enough redundancy for
/// close-range camera decode without inflating the symbol for the
/// short payloads we emit.
pub fn render_svg(encoded: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(encoded.as_bytes(), EcLevel::M)
        .map_err(|e| QrError::Render(e.to_string()))?;

    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build())
}
