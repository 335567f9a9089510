use std::collections::HashMap;

use crate::ledger::domain::face::SimilarFace;
use crate::shared::constants::CONFIRMED_SCORE;

/// A face ranked against a person. Confirmed faces score exactly 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredFace {
    pub face_id: String,
    pub score: f64,
}

/// A named identity and the faces an operator has confirmed as theirs.
#[derive(Clone, Debug)]
pub struct Person {
    name: String,
    pub(crate) faces: Vec<String>,
}

impl Person {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            faces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Confirmed face ids in confirmation order.
    pub fn face_ids(&self) -> &[String] {
        &self.faces
    }

    pub fn confirms(&self, face_id: &str) -> bool {
        self.faces.iter().any(|id| id == face_id)
    }
}

/// Ranks candidate faces for a person, best first.
///
/// `evidence` holds one search result per confirmed face. Each unconfirmed
/// candidate scores the sum of its similarities across all confirmed faces
/// divided by the number of confirmed faces, so a candidate corroborated by
/// every exemplar outranks one that only a single exemplar found. Candidates
/// for which `is_confirmed` holds are dropped. Confirmed faces are then added
/// at 1.0, replacing any guessed score. Ties keep first-seen order.
pub fn rank_faces(
    confirmed: &[String],
    evidence: &[Vec<SimilarFace>],
    is_confirmed: impl Fn(&str) -> bool,
) -> Vec<ScoredFace> {
    let mut ranked: Vec<ScoredFace> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for hit in evidence.iter().flatten() {
        if is_confirmed(&hit.face_id) {
            continue;
        }
        match slots.get(&hit.face_id) {
            Some(&slot) => ranked[slot].score += hit.similarity,
            None => {
                slots.insert(hit.face_id.clone(), ranked.len());
                ranked.push(ScoredFace {
                    face_id: hit.face_id.clone(),
                    score: hit.similarity,
                });
            }
        }
    }

    if !confirmed.is_empty() {
        let exemplars = confirmed.len() as f64;
        for guess in &mut ranked {
            guess.score /= exemplars;
        }
    }

    for face_id in confirmed {
        match slots.get(face_id) {
            Some(&slot) => ranked[slot].score = CONFIRMED_SCORE,
            None => {
                slots.insert(face_id.clone(), ranked.len());
                ranked.push(ScoredFace {
                    face_id: face_id.clone(),
                    score: CONFIRMED_SCORE,
                });
            }
        }
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
