use std::path::PathBuf;

use thiserror::Error;

use crate::recognition::domain::face_record::{FaceMatch, FacePage, FaceRecord, ImageLocation};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("collection already exists: {0}")]
    CollectionExists(String),
    #[error("image not found: s3://{bucket}/{name}")]
    ImageNotFound { bucket: String, name: String },
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("service error: {0}")]
    Service(String),
}

/// Domain interface for the face recognition service.
///
/// The service keeps a collection of every face it has indexed but has no
/// notion of identity. Calls are blocking request/response; failures are
/// returned as-is and never retried by the ledger.
pub trait RecognitionBackend: Send {
    /// Detects and indexes the faces in a stored image, tagging each with
    /// `external_image_id`.
    fn detect(
        &mut self,
        collection_id: &str,
        location: ImageLocation<'_>,
        external_image_id: &str,
        all_attributes: bool,
    ) -> Result<Vec<FaceRecord>, BackendError>;

    /// Finds indexed faces similar to `face_id`, similarity on a 0-100 scale.
    fn search(&mut self, collection_id: &str, face_id: &str)
        -> Result<Vec<FaceMatch>, BackendError>;

    /// Returns one page of the collection. Pass the previous page's token to
    /// continue; `next_page_token` is `None` on the last page.
    fn list_faces(
        &mut self,
        collection_id: &str,
        page_token: Option<&str>,
    ) -> Result<FacePage, BackendError>;

    /// Creates the collection and returns its ARN.
    fn create_collection(&mut self, collection_id: &str) -> Result<String, BackendError>;

    fn delete_collection(&mut self, collection_id: &str) -> Result<(), BackendError>;
}
