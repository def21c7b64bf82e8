//! Size-cap enforcement for uploads.
//!
//! Image re-encoding lives behind the [`ImageCodec`] collaborator; the
//! policy here decides when to invoke it. PDFs are never re-encoded — they
//! are size-checked only, and an over-cap PDF is surfaced to the user as
//! `CompressionLimitExceeded` so they can shrink it themselves.

use super::domain::MimeCategory;

/// External image compressor: shrink raw bytes under a byte target.
pub trait ImageCodec: Send + Sync {
    fn shrink_to(&self, bytes: &[u8], target_bytes: usize) -> Result<Vec<u8>, CompressionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("document exceeds the {limit}-byte cap and cannot be reduced further")]
    LimitExceeded { limit: usize },
    #[error("codec failure: {0}")]
    Codec(String),
}

impl CompressionError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LimitExceeded { .. } => "compression_limit_exceeded",
            Self::Codec(_) => "codec_error",
        }
    }
}

/// Bring upload bytes under the cap, or refuse.
pub fn prepare_for_storage(
    codec: &dyn ImageCodec,
    category: MimeCategory,
    bytes: Vec<u8>,
    cap: usize,
) -> Result<Vec<u8>, CompressionError> {
    if bytes.len() <= cap {
        return Ok(bytes);
    }

    if !category.is_image() {
        return Err(CompressionError::LimitExceeded { limit: cap });
    }

    let shrunk = codec.shrink_to(&bytes, cap)?;
    if shrunk.len() > cap {
        return Err(CompressionError::LimitExceeded { limit: cap });
    }
    Ok(shrunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TruncatingCodec;

    impl ImageCodec for TruncatingCodec {
        fn shrink_to(&self, bytes: &[u8], target_bytes: usize) -> Result<Vec<u8>, CompressionError> {
            Ok(bytes[..target_bytes.min(bytes.len())].to_vec())
        }
    }

    struct StubbornCodec;

    impl ImageCodec for StubbornCodec {
        fn shrink_to(&self, bytes: &[u8], _target: usize) -> Result<Vec<u8>, CompressionError> {
            Ok(bytes.to_vec())
        }
    }

    #[test]
    fn under_cap_bytes_pass_through_unchanged() {
        let bytes = vec![7u8; 128];
        let out =
            prepare_for_storage(&TruncatingCodec, MimeCategory::Pdf, bytes.clone(), 256).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn oversized_pdf_is_refused_without_reencoding() {
        let err = prepare_for_storage(&TruncatingCodec, MimeCategory::Pdf, vec![0u8; 512], 256)
            .unwrap_err();
        assert!(matches!(err, CompressionError::LimitExceeded { limit: 256 }));
        assert_eq!(err.kind(), "compression_limit_exceeded");
    }

    #[test]
    fn oversized_image_is_shrunk_through_the_codec() {
        let out =
            prepare_for_storage(&TruncatingCodec, MimeCategory::Jpeg, vec![1u8; 512], 256).unwrap();
        assert_eq!(out.len(), 256);
    }

    #[test]
    fn incompressible_image_surfaces_the_cap_error() {
        let err = prepare_for_storage(&StubbornCodec, MimeCategory::Png, vec![1u8; 512], 256)
            .unwrap_err();
        assert!(matches!(err, CompressionError::LimitExceeded { .. }));
    }
}
