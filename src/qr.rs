use image::{imageops, ImageBuffer, Rgb, RgbImage};
use ndarray::Array2;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

/// Pixels per QR module before the final resample.
pub const BOX_SIZE: u32 = 10;
/// Quiet zone width in modules.
pub const BORDER: u32 = 4;
/// Edge length of the QR image placed on the card.
pub const QR_SIZE: u32 = 100;

/// Dark modules are `true`. Indexed `[[y, x]]`.
pub type ModuleGrid = Array2<bool>;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR payload of {len} bytes does not fit in any QR version")]
    PayloadTooLarge { len: usize },
}

/// Text carried by the exam-centre QR code.
pub fn payload(exam_center: &str, city: &str, state: &str) -> String {
    format!("Exam Center: {exam_center}\nCity: {city}\nState: {state}")
}

/// Encodes the exam-centre details as a 100x100 QR raster.
///
/// The smallest QR version that holds the payload at error correction level L
/// is chosen. Empty fields are encoded as-is.
pub fn encode(exam_center: &str, city: &str, state: &str) -> Result<RgbImage, QrError> {
    let text = payload(exam_center, city, state);
    let modules = generate_module_grid(&text, EcLevel::L)?;
    let full = rasterize(&modules, BOX_SIZE, BORDER);

    Ok(imageops::resize(
        &full,
        QR_SIZE,
        QR_SIZE,
        imageops::FilterType::Lanczos3,
    ))
}

pub fn generate_module_grid(text: &str, ec_level: EcLevel) -> Result<ModuleGrid, QrError> {
    let code = QrCode::with_error_correction_level(text, ec_level)
        .map_err(|_| QrError::PayloadTooLarge { len: text.len() })?;

    let colors = code.to_colors();
    let width = code.width();
    log::debug!("QR symbol {:?}: {width}x{width} modules", code.version());

    Ok(Array2::from_shape_fn((width, width), |(y, x)| {
        matches!(colors[y * width + x], qrcode::Color::Dark)
    }))
}

/// Renders each module as a `box_size` square, surrounded by `border` light modules.
pub fn rasterize(modules: &ModuleGrid, box_size: u32, border: u32) -> RgbImage {
    let width = modules.ncols() as u32;
    let side = (width + 2 * border) * box_size;

    ImageBuffer::from_fn(side, side, |x, y| {
        let mx = (x / box_size).checked_sub(border);
        let my = (y / box_size).checked_sub(border);

        let is_dark = match (mx, my) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                modules[[my as usize, mx as usize]]
            }
            _ => false,
        };

        if is_dark {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Reads every QR code in `img`, upscaled 9x so small modules survive detection.
#[cfg(test)]
pub(crate) fn scan(img: &RgbImage) -> Vec<String> {
    let big = imageops::resize(
        img,
        img.width() * 9,
        img.height() * 9,
        imageops::FilterType::Nearest,
    );
    let gray = image::DynamicImage::ImageRgb8(big).to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(gray);
    prepared
        .detect_grids()
        .into_iter()
        .filter_map(|grid| grid.decode().ok().map(|(_, content)| content))
        .collect()
}
