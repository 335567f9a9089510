use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One face as the recognition service describes it.
///
/// Only the identifier and the external image id are interpreted. Everything
/// else the service returns (bounding box, confidence, landmarks, ...) is
/// kept verbatim in `attributes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceRecord {
    pub face_id: String,
    pub external_image_id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl FaceRecord {
    pub fn new(face_id: impl Into<String>, external_image_id: impl Into<String>) -> Self {
        Self {
            face_id: face_id.into(),
            external_image_id: external_image_id.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// A search hit. `similarity` is on the service's 0-100 scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceMatch {
    pub face: FaceRecord,
    pub similarity: f64,
}

/// One page of a collection listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FacePage {
    pub faces: Vec<FaceRecord>,
    #[serde(rename = "NextToken", default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Where the blob store keeps an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLocation<'a> {
    pub bucket: &'a str,
    pub name: &'a str,
}
