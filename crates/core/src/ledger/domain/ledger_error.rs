use std::fmt;

use thiserror::Error;

use crate::recognition::domain::recognition_backend::BackendError;

/// Which map a key lookup went to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Image,
    Face,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Person => write!(f, "person"),
            EntityKind::Image => write!(f, "image"),
            EntityKind::Face => write!(f, "face"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: EntityKind, key: String },
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },
    #[error("face {face_id} is already confirmed as {confirmed}, cannot confirm as {requested}")]
    Conflict {
        face_id: String,
        confirmed: String,
        requested: String,
    },
    #[error("a face id or a face record is required")]
    MissingFaceId,
    #[error("recognition backend failed: {0}")]
    Backend(#[from] BackendError),
}

impl LedgerError {
    pub(crate) fn already_exists(kind: EntityKind, key: &str) -> Self {
        LedgerError::AlreadyExists {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, key: &str) -> Self {
        LedgerError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_entity() {
        assert_eq!(
            LedgerError::already_exists(EntityKind::Person, "alice").to_string(),
            "person already exists: alice"
        );
        assert_eq!(
            LedgerError::not_found(EntityKind::Image, "a.jpg").to_string(),
            "image not found: a.jpg"
        );
    }

    #[test]
    fn test_backend_error_is_the_source() {
        use std::error::Error;

        let err = LedgerError::from(BackendError::Service("throttled".into()));

        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("service error: throttled".to_string())
        );
    }
}
