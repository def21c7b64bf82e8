use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::catalog::DocumentKind;
use crate::domain::{DocumentId, RequestId, UserId};

/// Accepted upload formats. Everything else is refused at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Jpeg,
    Png,
    Pdf,
}

impl MimeCategory {
    pub fn from_mime(mime: &Mime) -> Option<Self> {
        match (mime.type_(), mime.subtype()) {
            (mime::IMAGE, mime::JPEG) => Some(Self::Jpeg),
            (mime::IMAGE, mime::PNG) => Some(Self::Png),
            (mime::APPLICATION, mime::PDF) => Some(Self::Pdf),
            _ => None,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Pdf => ".pdf",
        }
    }

    pub const fn is_image(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// An uploaded supporting document.
///
/// Recurring documents are never edited in place: an update expires the old
/// row and inserts a replacement whose `replaces_document_id` points back,
/// keeping the full history as an append-only chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: UserId,
    pub kind: DocumentKind,
    /// Set for non-recurring documents; recurring ones attach through links.
    pub request_id: Option<RequestId>,
    pub original_name: String,
    pub stored_name: String,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub mime: MimeCategory,
    pub is_recurrent: bool,
    pub is_expired: bool,
    pub expired_at: Option<DateTime<Utc>>,
    pub replaces_document_id: Option<DocumentId>,
    pub created_at: DateTime<Utc>,
}

/// Join record attaching a recurring document to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentLink {
    pub document_id: DocumentId,
    pub request_id: RequestId,
    pub created_at: DateTime<Utc>,
}

/// Metadata accompanying an upload's raw bytes.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub request_id: Option<RequestId>,
    pub is_recurrent: bool,
    pub original_name: String,
    pub mime: Mime,
    pub bytes: Vec<u8>,
}

/// Replacement content for a recurring document; the kind is inherited from
/// the row being superseded.
#[derive(Debug, Clone)]
pub struct RecurrentRevision {
    pub original_name: String,
    pub mime: Mime,
    pub bytes: Vec<u8>,
}
