use crate::shared::lazy_cache::LazyCache;

/// An image already sitting in the blob store.
///
/// Faces are detected on first request and remembered; see
/// [`FaceDatabase::image_faces`](crate::ledger::face_database::FaceDatabase::image_faces).
#[derive(Clone, Debug)]
pub struct Image {
    url: String,
    pub(crate) faces: LazyCache<Vec<String>>,
}

impl Image {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            faces: LazyCache::Unpopulated,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ids of the detected faces, or `None` if detection hasn't run yet.
    pub fn face_ids(&self) -> Option<&[String]> {
        self.faces.get().map(Vec::as_slice)
    }

    pub fn is_indexed(&self) -> bool {
        self.faces.is_populated()
    }
}
