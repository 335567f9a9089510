use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::recognition::domain::face_record::{FaceMatch, FacePage, FaceRecord, ImageLocation};
use crate::recognition::domain::recognition_backend::{BackendError, RecognitionBackend};
use crate::shared::constants::DEFAULT_PAGE_SIZE;

/// Service responses captured ahead of time, keyed by request.
#[derive(Clone, Debug, Deserialize)]
pub struct Recording {
    pub collection_id: String,
    #[serde(default)]
    pub collection_arn: Option<String>,
    /// Image name → faces the service detected in it.
    #[serde(default)]
    pub detections: BTreeMap<String, Vec<FaceRecord>>,
    /// Face id → search hits, similarity on the 0-100 scale.
    #[serde(default)]
    pub matches: BTreeMap<String, Vec<FaceMatch>>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Replays a [`Recording`] in place of the live recognition service.
///
/// The recorded collection exists from the start. Creating or deleting
/// collections only changes which ids the backend accepts: every existing
/// collection, including one created later, replays the same recorded
/// responses. Detections are looked up by image name and tagged with the
/// external image id of the request, as the service does when indexing.
pub struct RecordedBackend {
    recording: Recording,
    collections: HashSet<String>,
}

impl RecordedBackend {
    pub fn new(recording: Recording) -> Self {
        let collections = HashSet::from([recording.collection_id.clone()]);
        Self {
            recording,
            collections,
        }
    }

    /// Loads a JSON recording from disk.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let json = fs::read_to_string(path).map_err(|source| BackendError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let recording: Recording = serde_json::from_str(&json)?;
        log::debug!(
            "Loaded recording for collection {} ({} images, {} match lists)",
            recording.collection_id,
            recording.detections.len(),
            recording.matches.len()
        );
        Ok(Self::new(recording))
    }

    fn require_collection(&self, collection_id: &str) -> Result<(), BackendError> {
        if self.collections.contains(collection_id) {
            Ok(())
        } else {
            Err(BackendError::CollectionNotFound(collection_id.to_string()))
        }
    }

    /// Every distinct recorded face: detections first, then faces that only
    /// appear as search hits.
    fn indexed_faces(&self) -> Vec<&FaceRecord> {
        let mut seen = HashSet::new();
        let detected = self.recording.detections.values().flatten();
        let matched = self
            .recording
            .matches
            .values()
            .flatten()
            .map(|hit| &hit.face);
        detected
            .chain(matched)
            .filter(|record| seen.insert(record.face_id.as_str()))
            .collect()
    }
}

impl RecognitionBackend for RecordedBackend {
    fn detect(
        &mut self,
        collection_id: &str,
        location: ImageLocation<'_>,
        external_image_id: &str,
        _all_attributes: bool,
    ) -> Result<Vec<FaceRecord>, BackendError> {
        self.require_collection(collection_id)?;
        let recorded = self
            .recording
            .detections
            .get(location.name)
            .ok_or_else(|| BackendError::ImageNotFound {
                bucket: location.bucket.to_string(),
                name: location.name.to_string(),
            })?;
        Ok(recorded
            .iter()
            .map(|record| FaceRecord {
                external_image_id: external_image_id.to_string(),
                ..record.clone()
            })
            .collect())
    }

    fn search(
        &mut self,
        collection_id: &str,
        face_id: &str,
    ) -> Result<Vec<FaceMatch>, BackendError> {
        self.require_collection(collection_id)?;
        Ok(self
            .recording
            .matches
            .get(face_id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_faces(
        &mut self,
        collection_id: &str,
        page_token: Option<&str>,
    ) -> Result<FacePage, BackendError> {
        self.require_collection(collection_id)?;
        let faces = self.indexed_faces();
        let start = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|&offset| offset < faces.len())
                .ok_or_else(|| BackendError::InvalidPageToken(token.to_string()))?,
        };
        let end = (start + self.recording.page_size.max(1)).min(faces.len());
        let next_page_token = (end < faces.len()).then(|| end.to_string());
        Ok(FacePage {
            faces: faces[start..end].iter().map(|&record| record.clone()).collect(),
            next_page_token,
        })
    }

    fn create_collection(&mut self, collection_id: &str) -> Result<String, BackendError> {
        if !self.collections.insert(collection_id.to_string()) {
            return Err(BackendError::CollectionExists(collection_id.to_string()));
        }
        Ok(match &self.recording.collection_arn {
            Some(arn) if collection_id == self.recording.collection_id => arn.clone(),
            _ => format!("arn:recorded:rekognition:collection/{collection_id}"),
        })
    }

    fn delete_collection(&mut self, collection_id: &str) -> Result<(), BackendError> {
        if self.collections.remove(collection_id) {
            Ok(())
        } else {
            Err(BackendError::CollectionNotFound(collection_id.to_string()))
        }
    }
}
