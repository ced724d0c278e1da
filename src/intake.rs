//! Form submission handling around the layout engine: field validation,
//! upload decoding and the face/signature presence checks.

use image::DynamicImage;
use thiserror::Error;

use crate::error::{ImageRole, RenderError};
use crate::layout::{decode_image, AdmitCard, LayoutEngine};
use crate::record::{CandidateRecord, ValidationError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("No face detected in the profile photo. Please upload a photo with a clear face.")]
    NoFace,

    #[error("No signature detected. Please upload a clear signature.")]
    NoSignature,

    #[error("detection service unavailable: {0}")]
    Unavailable(String),
}

/// Checks uploads for a face or a signature before they reach the card.
pub trait DetectionService {
    fn detect_face(&self, photo: &DynamicImage) -> Result<(), DetectionError>;

    fn detect_signature(&self, signature: &DynamicImage) -> Result<(), DetectionError>;
}

/// Accepts every upload. Used when no detection backend is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrustUploads;

impl DetectionService for TrustUploads {
    fn detect_face(&self, _photo: &DynamicImage) -> Result<(), DetectionError> {
        Ok(())
    }

    fn detect_signature(&self, _signature: &DynamicImage) -> Result<(), DetectionError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Please upload both profile photo and signature ({0} missing).")]
    MissingUpload(ImageRole),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub fn decode_upload(bytes: &[u8], role: ImageRole) -> Result<DynamicImage, IntakeError> {
    if bytes.is_empty() {
        return Err(IntakeError::MissingUpload(role));
    }
    Ok(decode_image(bytes, role)?)
}

/// Validates a submission end to end and composes its admit card.
pub fn generate(
    engine: &LayoutEngine,
    detector: &dyn DetectionService,
    record: &CandidateRecord,
    profile: &[u8],
    signature: &[u8],
) -> Result<AdmitCard, IntakeError> {
    record.validate()?;

    let profile = decode_upload(profile, ImageRole::Profile)?;
    let signature = decode_upload(signature, ImageRole::Signature)?;

    detector.detect_face(&profile)?;
    detector.detect_signature(&signature)?;
    log::debug!("Uploads passed detection");

    Ok(engine.compose(record, &profile, &signature)?)
}
