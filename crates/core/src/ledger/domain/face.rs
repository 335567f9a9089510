use crate::recognition::domain::face_record::FaceRecord;
use crate::shared::constants::CONFIRMED_SCORE;
use crate::shared::lazy_cache::LazyCache;

/// A search hit resolved into the ledger. `similarity` is in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarFace {
    pub face_id: String,
    pub similarity: f64,
}

/// A possible identity for a face.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonGuess {
    pub name: String,
    pub score: f64,
}

/// One face the recognition service has indexed.
///
/// The image and the confirmed person are held by key and resolved through
/// the database that owns this face.
#[derive(Clone, Debug)]
pub struct Face {
    face_id: String,
    record: FaceRecord,
    image_url: String,
    pub(crate) similar: LazyCache<Vec<SimilarFace>>,
    pub(crate) person: Option<String>,
}

impl Face {
    pub(crate) fn new(face_id: &str, record: FaceRecord, image_url: &str) -> Self {
        Self {
            face_id: face_id.to_string(),
            record,
            image_url: image_url.to_string(),
            similar: LazyCache::Unpopulated,
            person: None,
        }
    }

    pub fn face_id(&self) -> &str {
        &self.face_id
    }

    /// The detection data exactly as the service returned it.
    pub fn record(&self) -> &FaceRecord {
        &self.record
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Name of the confirmed person, if any.
    pub fn person(&self) -> Option<&str> {
        self.person.as_deref()
    }

    /// Cached search hits, or `None` if no search has run yet.
    pub fn similar(&self) -> Option<&[SimilarFace]> {
        self.similar.get().map(Vec::as_slice)
    }
}

/// Who a face might be.
///
/// A confirmed face is its person with certainty. Otherwise every similar
/// face that has been confirmed lends its person, scored by similarity, in
/// the order the hits came back.
pub fn guess_persons<'a>(
    confirmed: Option<&str>,
    similar: &[SimilarFace],
    person_of: impl Fn(&str) -> Option<&'a str>,
) -> Vec<PersonGuess> {
    if let Some(name) = confirmed {
        return vec![PersonGuess {
            name: name.to_string(),
            score: CONFIRMED_SCORE,
        }];
    }
    similar
        .iter()
        .filter_map(|hit| {
            person_of(&hit.face_id).map(|name| PersonGuess {
                name: name.to_string(),
                score: hit.similarity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn hit(face_id: &str, similarity: f64) -> SimilarFace {
        SimilarFace {
            face_id: face_id.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_new_face_is_unconfirmed_and_unsearched() {
        let face = Face::new("f-1", FaceRecord::new("f-1", "a.jpg"), "a.jpg");

        assert_eq!(face.face_id(), "f-1");
        assert_eq!(face.image_url(), "a.jpg");
        assert_eq!(face.person(), None);
        assert_eq!(face.similar(), None);
    }

    #[test]
    fn test_confirmed_face_is_certain() {
        let similar = vec![hit("f-2", 0.9)];
        let persons = HashMap::from([("f-2", "bob")]);

        let guesses = guess_persons(Some("alice"), &similar, |id| persons.get(id).copied());

        assert_eq!(guesses.len(), 1);
        assert_eq!(guesses[0].name, "alice");
        assert_relative_eq!(guesses[0].score, 1.0);
    }

    #[test]
    fn test_unconfirmed_face_borrows_persons_of_similar_faces() {
        let similar = vec![hit("f-2", 0.9), hit("f-3", 0.7), hit("f-4", 0.5)];
        let persons = HashMap::from([("f-2", "bob"), ("f-4", "carol")]);

        let guesses = guess_persons(None, &similar, |id| persons.get(id).copied());

        assert_eq!(
            guesses,
            vec![
                PersonGuess {
                    name: "bob".into(),
                    score: 0.9
                },
                PersonGuess {
                    name: "carol".into(),
                    score: 0.5
                },
            ]
        );
    }

    #[test]
    fn test_no_confirmed_neighbours_means_no_guesses() {
        let similar = vec![hit("f-2", 0.9)];
        let guesses = guess_persons(None, &similar, |_| None);
        assert!(guesses.is_empty());
    }
}
