use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale};

use crate::error::RenderError;

/// Environment variable naming a TrueType/OpenType font to render with.
pub const FONT_ENV: &str = "ADMIT_CARD_FONT";

/// Checked in order when no font is given explicitly.
const SYSTEM_FONTS: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
];

/// A parsed font, and the file it came from when loaded from disk.
pub struct Typeface {
    font: FontVec,
    path: Option<PathBuf>,
}

impl Typeface {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| RenderError::FontUnavailable {
            path: Some(path.to_path_buf()),
            reason: err.to_string(),
        })?;

        let typeface = Self::from_bytes(data).map_err(|err| match err {
            RenderError::FontUnavailable { reason, .. } => RenderError::FontUnavailable {
                path: Some(path.to_path_buf()),
                reason,
            },
            other => other,
        })?;

        log::debug!("Loaded font {}", path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..typeface
        })
    }

    /// Parses font data already in memory, e.g. from `include_bytes!`.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RenderError> {
        let font = FontVec::try_from_vec(data).map_err(|err| RenderError::FontUnavailable {
            path: None,
            reason: format!("not a usable font: {err}"),
        })?;
        Ok(Self { font, path: None })
    }

    /// Loads `explicit` if given, otherwise the font named by `ADMIT_CARD_FONT`,
    /// otherwise the first well-known system font that exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, RenderError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os(FONT_ENV) {
            return Self::load(PathBuf::from(path));
        }

        let found = SYSTEM_FONTS.iter().map(Path::new).find(|p| p.is_file());
        match found {
            Some(path) => Self::load(path),
            None => Err(RenderError::FontUnavailable {
                path: None,
                reason: format!("no system font found; set {FONT_ENV} or pass a font path"),
            }),
        }
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Scale at which one em spans `size` pixels.
    ///
    /// `PxScale` is the ascent-to-descent height, which is larger than the em
    /// for most fonts.
    pub fn scale(&self, size: f32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1.0);
        PxScale::from(size * self.font.height_unscaled() / units_per_em)
    }

    /// Width and height in pixels of `text` with a `size` px em.
    pub fn measure(&self, size: f32, text: &str) -> (u32, u32) {
        imageproc::drawing::text_size(self.scale(size), &self.font, text)
    }
}

#[cfg(test)]
pub(crate) fn bundled() -> Typeface {
    Typeface::from_bytes(include_bytes!("../assets/fonts/DejaVuSans.ttf").to_vec())
        .expect("bundled DejaVu Sans parses")
}
