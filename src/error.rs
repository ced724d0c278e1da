use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two uploaded images an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
    Profile,
    Signature,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Profile => f.write_str("profile photo"),
            ImageRole::Signature => f.write_str("signature"),
        }
    }
}

/// Failure while composing an admit card.
///
/// Composition is atomic: any of these means no card was produced.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("font unavailable ({}): {reason}", display_path(.path))]
    FontUnavailable {
        path: Option<PathBuf>,
        reason: String,
    },

    #[error("invalid {role}: {reason}")]
    InvalidImage { role: ImageRole, reason: String },

    #[error("failed to draw admit card: {0}")]
    DrawFailure(String),
}

impl RenderError {
    /// True when the user can fix the failure by uploading a different image.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, RenderError::InvalidImage { .. })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "no candidate path".to_string(),
    }
}
