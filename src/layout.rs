use std::io::Cursor;
use std::path::Path;

use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{ImageRole, RenderError};
use crate::font::Typeface;
use crate::qr;
use crate::record::CandidateRecord;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
const FRAME_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const HEADER_Y: i32 = 20;
const HEADER_SIZE: f32 = 36.0;
const NAME_SIZE: f32 = 24.0;
const INFO_SIZE: f32 = 20.0;
const TEXT_LEFT: i32 = 50;

pub const PHOTO_SIZE: u32 = 150;
pub const PHOTO_BORDER: u32 = 5;

/// Axis-aligned rectangle on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    fn fits(&self, canvas: &RgbImage) -> bool {
        self.x + self.width <= canvas.width() && self.y + self.height <= canvas.height()
    }
}

pub const PHOTO_FRAME: Placement = Placement {
    x: CANVAS_WIDTH - 285,
    y: 120,
    width: PHOTO_SIZE + 2 * PHOTO_BORDER,
    height: PHOTO_SIZE + 2 * PHOTO_BORDER,
};

pub const SIGNATURE: Placement = Placement {
    x: CANVAS_WIDTH - 300,
    y: 480,
    width: 200,
    height: 80,
};

pub const QR_CODE: Placement = Placement {
    x: 50,
    y: CANVAS_HEIGHT - 150,
    width: qr::QR_SIZE,
    height: qr::QR_SIZE,
};

/// One line of text with its top-left origin and pixel size.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub size: f32,
}

/// A composed 800x600 RGB admit card.
#[derive(Clone, Debug)]
pub struct AdmitCard(RgbImage);

impl AdmitCard {
    pub fn image(&self) -> &RgbImage {
        &self.0
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Cursor::new(Vec::new());
        self.0
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|err| RenderError::DrawFailure(format!("PNG encoding failed: {err}")))?;
        Ok(bytes.into_inner())
    }
}

/// Lays candidate details, photo, signature and QR code out on the fixed template.
pub struct LayoutEngine {
    typeface: Typeface,
}

impl LayoutEngine {
    pub fn new(typeface: Typeface) -> Self {
        Self { typeface }
    }

    pub fn load(font_path: impl AsRef<Path>) -> Result<Self, RenderError> {
        Typeface::load(font_path).map(Self::new)
    }

    pub fn discover(font_path: Option<&Path>) -> Result<Self, RenderError> {
        Typeface::discover(font_path).map(Self::new)
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    /// Left edge that centres `text` horizontally at header size.
    pub fn header_x(&self, text: &str) -> i32 {
        let (width, _) = self.typeface.measure(HEADER_SIZE, text);
        (CANVAS_WIDTH as i32 - width as i32).div_euclid(2)
    }

    /// Every text line of the card, positioned.
    pub fn text_lines(&self, record: &CandidateRecord) -> Vec<TextLine> {
        let header = record.header();
        let line = |text: String, y: i32, size: f32| TextLine {
            text,
            x: TEXT_LEFT,
            y,
            size,
        };

        vec![
            TextLine {
                x: self.header_x(&header),
                text: header,
                y: HEADER_Y,
                size: HEADER_SIZE,
            },
            line(record.name_line(), 130, NAME_SIZE),
            line(record.exam_date_line(), 170, INFO_SIZE),
            line(record.exam_time_line(), 210, INFO_SIZE),
            line(record.date_of_birth_line(), 245, INFO_SIZE),
            line(record.city_line(), 282, INFO_SIZE),
            line(record.state_line(), 312, INFO_SIZE),
            line(record.exam_center_line(), 342, INFO_SIZE),
        ]
    }

    /// Composes a card from already-decoded images. The images are only read.
    ///
    /// Field emptiness is not checked here; see [`CandidateRecord::validate`].
    pub fn compose(
        &self,
        record: &CandidateRecord,
        profile: &DynamicImage,
        signature: &DynamicImage,
    ) -> Result<AdmitCard, RenderError> {
        check_dimensions(profile, ImageRole::Profile)?;
        check_dimensions(signature, ImageRole::Signature)?;

        // Everything fallible happens before the canvas exists.
        let photo = framed_photo(profile);
        let signature = imageops::resize(
            &signature.to_rgb8(),
            SIGNATURE.width,
            SIGNATURE.height,
            imageops::FilterType::CatmullRom,
        );
        let qr = qr::encode(&record.exam_center, &record.city, &record.state)
            .map_err(|err| RenderError::DrawFailure(err.to_string()))?;

        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);

        for line in self.text_lines(record) {
            log::debug!("Drawing {:?} at ({}, {})", line.text, line.x, line.y);
            imageproc::drawing::draw_text_mut(
                &mut canvas,
                INK,
                line.x,
                line.y,
                self.typeface.scale(line.size),
                self.typeface.font(),
                &line.text,
            );
        }

        paste(&mut canvas, &photo, PHOTO_FRAME)?;
        paste(&mut canvas, &signature, SIGNATURE)?;
        paste(&mut canvas, &qr, QR_CODE)?;

        log::info!("Composed admit card for {}", record.name);
        Ok(AdmitCard(canvas))
    }

    /// Decodes both uploads, then composes.
    pub fn compose_encoded(
        &self,
        record: &CandidateRecord,
        profile: &[u8],
        signature: &[u8],
    ) -> Result<AdmitCard, RenderError> {
        let profile = decode_image(profile, ImageRole::Profile)?;
        let signature = decode_image(signature, ImageRole::Signature)?;
        self.compose(record, &profile, &signature)
    }
}

/// Decodes an uploaded JPEG/PNG (or any format `image` recognises).
pub fn decode_image(bytes: &[u8], role: ImageRole) -> Result<DynamicImage, RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::InvalidImage {
            role,
            reason: "no image data".into(),
        });
    }

    let image = image::load_from_memory(bytes).map_err(|err| RenderError::InvalidImage {
        role,
        reason: format!("cannot decode image: {err}"),
    })?;
    check_dimensions(&image, role)?;
    Ok(image)
}

fn check_dimensions(image: &DynamicImage, role: ImageRole) -> Result<(), RenderError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(RenderError::InvalidImage {
            role,
            reason: format!("image is {}x{}", image.width(), image.height()),
        });
    }
    Ok(())
}

/// Photo stretched to 150x150 on a solid 160x160 frame.
fn framed_photo(profile: &DynamicImage) -> RgbImage {
    let photo = imageops::resize(
        &profile.to_rgb8(),
        PHOTO_SIZE,
        PHOTO_SIZE,
        imageops::FilterType::CatmullRom,
    );

    let mut frame = RgbImage::from_pixel(PHOTO_FRAME.width, PHOTO_FRAME.height, FRAME_COLOR);
    imageops::replace(&mut frame, &photo, PHOTO_BORDER as i64, PHOTO_BORDER as i64);
    frame
}

fn paste(canvas: &mut RgbImage, top: &RgbImage, at: Placement) -> Result<(), RenderError> {
    if top.dimensions() != (at.width, at.height) || !at.fits(canvas) {
        return Err(RenderError::DrawFailure(format!(
            "{}x{} element does not fit {at:?}",
            top.width(),
            top.height()
        )));
    }

    imageops::replace(canvas, top, at.x as i64, at.y as i64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;
    use image::{ImageBuffer, Luma};

    fn engine() -> LayoutEngine {
        LayoutEngine::new(crate::font::bundled())
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn close_to(pixel: &Rgb<u8>, expected: [u8; 3]) -> bool {
        pixel
            .0
            .iter()
            .zip(expected)
            .all(|(&got, want)| got.abs_diff(want) <= 2)
    }

    fn luma(pixel: &Rgb<u8>) -> u32 {
        pixel.0.iter().map(|&c| c as u32).sum::<u32>() / 3
    }

    fn dark_pixels(card: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> usize {
        (y..y + height)
            .flat_map(|py| (x..x + width).map(move |px| (px, py)))
            .filter(|&(px, py)| luma(card.get_pixel(px, py)) < 128)
            .count()
    }

    #[test]
    fn output_size_is_fixed() {
        let engine = engine();
        let record = sample_record();

        for (w, h) in [(1, 1), (37, 2000), (4000, 300)] {
            let card = engine
                .compose(&record, &solid(w, h, [10, 200, 30]), &solid(h, w, [0, 0, 255]))
                .unwrap();
            assert_eq!(card.image().dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        }

        let long = CandidateRecord {
            exam_name: "Combined Graduate Level Examination Tier Two Descriptive Paper".into(),
            ..record
        };
        let card = engine
            .compose(&long, &solid(10, 10, [0, 0, 0]), &solid(10, 10, [0, 0, 0]))
            .unwrap();
        assert_eq!(card.image().dimensions(), (800, 600));
    }

    #[test]
    fn header_is_centred() {
        let engine = engine();

        let short = "Admit Card for NAT";
        let long = "Admit Card for National Aptitude Test";
        let left_short = engine.header_x(short);
        let left_long = engine.header_x(long);
        assert!(left_short > left_long);

        for (text, left) in [(short, left_short), (long, left_long)] {
            let (width, _) = engine.typeface().measure(HEADER_SIZE, text);
            let centre = left as f32 + width as f32 / 2.0;
            assert!((centre - 400.0).abs() <= 1.0, "{text}: centre at {centre}");
        }
    }

    #[test]
    fn text_lines_follow_template() {
        let engine = engine();
        let lines = engine.text_lines(&sample_record());

        let positions: Vec<_> = lines.iter().skip(1).map(|l| (l.x, l.y, l.size)).collect();
        assert_eq!(
            positions,
            vec![
                (50, 130, 24.0),
                (50, 170, 20.0),
                (50, 210, 20.0),
                (50, 245, 20.0),
                (50, 282, 20.0),
                (50, 312, 20.0),
                (50, 342, 20.0),
            ]
        );

        assert_eq!(lines[0].y, 20);
        assert_eq!(lines[0].size, 36.0);
        assert_eq!(lines[0].text, "Admit Card for National Aptitude Test");
        assert_eq!(lines[7].text, "Exam Center: Center 12");
    }

    #[test]
    fn photo_is_framed_at_fixed_position() {
        let red = [220, 20, 20];
        let card = engine()
            .compose(&sample_record(), &solid(640, 480, red), &solid(300, 90, [0, 0, 255]))
            .unwrap();
        let img = card.image();

        // Frame corners and border.
        for (x, y) in [(515, 120), (674, 120), (515, 279), (674, 279), (519, 124), (670, 275)] {
            assert_eq!(img.get_pixel(x, y), &FRAME_COLOR, "frame at ({x}, {y})");
        }
        // Photo occupies exactly 150x150 starting 5px in.
        for (x, y) in [(520, 125), (669, 125), (520, 274), (669, 274), (595, 200)] {
            assert!(close_to(img.get_pixel(x, y), red), "photo at ({x}, {y})");
        }
        // Nothing outside the frame.
        assert_eq!(img.get_pixel(675, 200), &BACKGROUND);
        assert_eq!(img.get_pixel(595, 119), &BACKGROUND);
        assert_eq!(img.get_pixel(595, 280), &BACKGROUND);
    }

    #[test]
    fn signature_is_stretched_to_200x80() {
        let blue = [10, 20, 230];
        let card = engine()
            .compose(&sample_record(), &solid(50, 50, [0, 0, 0]), &solid(37, 11, blue))
            .unwrap();
        let img = card.image();

        for (x, y) in [(500, 480), (699, 480), (500, 559), (699, 559)] {
            assert!(close_to(img.get_pixel(x, y), blue), "signature at ({x}, {y})");
        }
        for (x, y) in [(499, 500), (700, 500), (600, 479), (600, 560)] {
            assert_eq!(img.get_pixel(x, y), &BACKGROUND, "outside signature at ({x}, {y})");
        }
    }

    #[test]
    fn qr_code_sits_bottom_left() {
        let card = engine()
            .compose(&sample_record(), &solid(50, 50, [0, 0, 0]), &solid(50, 50, [0, 0, 0]))
            .unwrap();
        let img = card.image();

        let expected = qr::encode("Center 12", "Pune", "Maharashtra").unwrap();
        for (x, y, pixel) in expected.enumerate_pixels() {
            assert_eq!(img.get_pixel(QR_CODE.x + x, QR_CODE.y + y), pixel);
        }

        // Quiet zone is light, the core of the top-left finder is dark.
        let modules = qr::generate_module_grid(
            &qr::payload("Center 12", "Pune", "Maharashtra"),
            qrcode::EcLevel::L,
        )
        .unwrap();
        let total = (modules.ncols() as u32 + 2 * qr::BORDER) as f32;
        let core = (7.5 * qr::QR_SIZE as f32 / total) as u32;
        assert!(luma(img.get_pixel(QR_CODE.x + 2, QR_CODE.y + 2)) > 200);
        assert!(luma(img.get_pixel(QR_CODE.x + core, QR_CODE.y + core)) < 100);
        assert_eq!(img.get_pixel(49, 500), &BACKGROUND);
        assert_eq!(img.get_pixel(100, 550), &BACKGROUND);
    }

    #[test]
    fn text_is_drawn() {
        let card = engine()
            .compose(
                &sample_record(),
                &solid(50, 50, [255, 255, 255]),
                &solid(50, 50, [255, 255, 255]),
            )
            .unwrap();
        let img = card.image();

        assert!(dark_pixels(img, 0, 15, 800, 60) > 0, "header");
        for y in [130, 170, 210, 245, 282, 312, 342] {
            assert!(dark_pixels(img, 50, y, 300, 28) > 0, "line at y={y}");
        }
        // Gap between the text block and the QR code stays blank.
        assert_eq!(dark_pixels(img, 0, 400, 500, 45), 0);
    }

    #[test]
    fn caller_images_are_untouched() {
        let profile = solid(30, 40, [1, 2, 3]);
        let signature = solid(40, 30, [4, 5, 6]);
        let before = (profile.clone(), signature.clone());

        engine().compose(&sample_record(), &profile, &signature).unwrap();

        assert_eq!(profile, before.0);
        assert_eq!(signature, before.1);
    }

    #[test]
    fn zero_sized_profile_is_rejected() {
        let err = engine()
            .compose(&sample_record(), &solid(0, 0, [0, 0, 0]), &solid(10, 10, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidImage { role: ImageRole::Profile, .. }));

        let err = engine()
            .compose(&sample_record(), &solid(10, 10, [0, 0, 0]), &solid(10, 0, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidImage { role: ImageRole::Signature, .. }));
    }

    #[test]
    fn undecodable_profile_is_rejected() {
        let mut signature = Vec::new();
        solid(20, 10, [0, 0, 0])
            .write_to(&mut Cursor::new(&mut signature), ImageFormat::Png)
            .unwrap();

        let engine = engine();
        let record = sample_record();

        let err = engine
            .compose_encoded(&record, b"not an image at all", &signature)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidImage { role: ImageRole::Profile, .. }));
        assert!(err.is_user_correctable());

        let err = engine.compose_encoded(&record, &[], &signature).unwrap_err();
        assert!(matches!(err, RenderError::InvalidImage { role: ImageRole::Profile, .. }));
    }

    #[test]
    fn missing_font_fails_before_any_drawing() {
        let err = LayoutEngine::load("/no/such/dir/arial.ttf").err().unwrap();
        assert!(matches!(err, RenderError::FontUnavailable { .. }));
        assert!(!err.is_user_correctable());
    }

    #[test]
    fn oversized_qr_payload_fails_without_output() {
        let record = CandidateRecord {
            exam_center: "x".repeat(3000),
            ..sample_record()
        };
        let err = engine()
            .compose(&record, &solid(10, 10, [0, 0, 0]), &solid(10, 10, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, RenderError::DrawFailure(_)));
    }

    #[test]
    fn asha_rao_end_to_end() {
        let mut photo = Vec::new();
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(120, 160, |x, y| {
            Rgb([(x * 2) as u8, (y + 40) as u8, 128])
        }))
        .write_to(&mut Cursor::new(&mut photo), ImageFormat::Jpeg)
        .unwrap();

        let mut signature = Vec::new();
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(300, 100, |x, y| {
            Luma([if (x + y) % 7 == 0 { 0 } else { 255 }])
        }))
        .write_to(&mut Cursor::new(&mut signature), ImageFormat::Jpeg)
        .unwrap();

        let engine = engine();
        let record = sample_record();
        let card = engine.compose_encoded(&record, &photo, &signature).unwrap();

        let png = card.to_png().unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8(), *card.image());

        let lines: Vec<_> = engine.text_lines(&record).into_iter().map(|l| l.text).collect();
        assert_eq!(
            lines,
            vec![
                "Admit Card for National Aptitude Test",
                "Name: Asha Rao",
                "Exam Date: June 10, 2024",
                "Exam Time: 09:30 AM",
                "Date of Birth: January 15, 2000",
                "City: Pune",
                "State: Maharashtra",
                "Exam Center: Center 12",
            ]
        );

        assert_eq!(
            qr::payload(&record.exam_center, &record.city, &record.state),
            "Exam Center: Center 12\nCity: Pune\nState: Maharashtra"
        );
        assert_eq!(card.image().get_pixel(515, 120), &FRAME_COLOR);

        let qr = imageops::crop_imm(
            card.image(),
            QR_CODE.x,
            QR_CODE.y,
            QR_CODE.width,
            QR_CODE.height,
        )
        .to_image();
        assert_eq!(qr::scan(&qr), vec!["Exam Center: Center 12\nCity: Pune\nState: Maharashtra"]);
    }

    #[test]
    fn header_is_measured_at_em_size() {
        let engine = engine();

        // DejaVu Sans advances for this header sum to about 678px at a 36px em.
        let (width, _) = engine
            .typeface()
            .measure(HEADER_SIZE, "Admit Card for National Aptitude Test");
        assert!((665..=690).contains(&width), "header width {width}");

        let left = engine.text_lines(&sample_record())[0].x;
        assert!((55..=68).contains(&left), "header left edge {left}");
    }
}
