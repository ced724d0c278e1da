//! Composes exam admit cards: candidate details, a framed profile photo, a
//! signature and an exam-centre QR code on a fixed 800x600 template.

pub mod error;
pub mod font;
pub mod intake;
pub mod layout;
pub mod qr;
pub mod record;

pub use error::{ImageRole, RenderError};
pub use intake::{DetectionService, TrustUploads};
pub use layout::{AdmitCard, LayoutEngine};
pub use record::CandidateRecord;
