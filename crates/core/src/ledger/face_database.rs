use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::ledger::domain::face::{guess_persons, Face, PersonGuess, SimilarFace};
use crate::ledger::domain::image::Image;
use crate::ledger::domain::ledger_error::{EntityKind, LedgerError};
use crate::ledger::domain::person::{rank_faces, Person, ScoredFace};
use crate::recognition::domain::face_record::{FaceRecord, ImageLocation};
use crate::recognition::domain::recognition_backend::RecognitionBackend;
use crate::shared::constants::{DEFAULT_BUCKET, DEFAULT_COLLECTION_ID, SIMILARITY_SCALE};
use crate::shared::lazy_cache::LazyCache;

/// Where the database's faces and images live on the service side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    pub collection_id: String,
    pub bucket: String,
    /// Create the collection when the database is constructed.
    pub create_collection: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            collection_id: DEFAULT_COLLECTION_ID.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            create_collection: false,
        }
    }
}

/// Owns every image, face and person, and is the only caller of the
/// recognition backend.
///
/// Entities refer to each other by key (image url, face id, person name) and
/// are resolved here. Faces and images are created lazily the first time a
/// backend response mentions them.
pub struct FaceDatabase {
    backend: Box<dyn RecognitionBackend>,
    collection_id: String,
    bucket: String,
    persons: HashMap<String, Person>,
    images: HashMap<String, Image>,
    faces: HashMap<String, Face>,
}

impl FaceDatabase {
    pub fn new(
        backend: Box<dyn RecognitionBackend>,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        let mut db = Self {
            backend,
            collection_id: config.collection_id,
            bucket: config.bucket,
            persons: HashMap::new(),
            images: HashMap::new(),
            faces: HashMap::new(),
        };
        if config.create_collection {
            db.create_all()?;
        }
        Ok(db)
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    // ── Persons ──────────────────────────────────────────────────────

    pub fn add_person(&mut self, name: &str) -> Result<&Person, LedgerError> {
        match self.persons.entry(name.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::already_exists(EntityKind::Person, name)),
            Entry::Vacant(slot) => {
                log::info!("Added person {name}");
                Ok(&*slot.insert(Person::new(name)))
            }
        }
    }

    pub fn get_person(&mut self, name: &str, create: bool) -> Result<&Person, LedgerError> {
        if create && !self.persons.contains_key(name) {
            return self.add_person(name);
        }
        self.persons
            .get(name)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Person, name))
    }

    pub fn person(&self, name: &str) -> Option<&Person> {
        self.persons.get(name)
    }

    pub fn list_persons(&self) -> Vec<String> {
        sorted_keys(&self.persons)
    }

    // ── Images ───────────────────────────────────────────────────────

    /// Registers an image; with `index`, detects its faces right away.
    pub fn add_image(&mut self, url: &str, index: bool) -> Result<&Image, LedgerError> {
        if self.images.contains_key(url) {
            return Err(LedgerError::already_exists(EntityKind::Image, url));
        }
        self.images.insert(url.to_string(), Image::new(url));
        log::info!("Added image {url}");
        if index {
            self.image_faces(url)?;
        }
        self.images
            .get(url)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Image, url))
    }

    /// Looks up an image. With `create`, an unknown url is registered
    /// without running detection.
    pub fn get_image(&mut self, url: &str, create: bool) -> Result<&Image, LedgerError> {
        if create && !self.images.contains_key(url) {
            return self.add_image(url, false);
        }
        self.images
            .get(url)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Image, url))
    }

    pub fn image(&self, url: &str) -> Option<&Image> {
        self.images.get(url)
    }

    pub fn list_images(&self) -> Vec<String> {
        sorted_keys(&self.images)
    }

    /// Face ids detected in an image. Detection runs once per image; later
    /// calls are served from the cache.
    pub fn image_faces(&mut self, url: &str) -> Result<&[String], LedgerError> {
        let indexed = self
            .images
            .get(url)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Image, url))?
            .is_indexed();
        if indexed {
            log::debug!("Faces of {url} served from cache");
        } else {
            let face_ids = self.index_faces(url)?;
            if let Some(image) = self.images.get_mut(url) {
                image.faces.populate(face_ids);
            }
        }
        Ok(self
            .images
            .get(url)
            .and_then(Image::face_ids)
            .unwrap_or_default())
    }

    // ── Faces ────────────────────────────────────────────────────────

    /// Resolves a face by id, or by the id inside `record` when no id is
    /// given. An unknown face is built from `record` when `create` is set;
    /// a known face is returned as is.
    pub fn get_face(
        &mut self,
        face_id: Option<&str>,
        record: Option<&FaceRecord>,
        create: bool,
    ) -> Result<&Face, LedgerError> {
        let face_id = match (face_id, record) {
            (Some(face_id), _) => face_id.to_string(),
            (None, Some(record)) => record.face_id.clone(),
            (None, None) => return Err(LedgerError::MissingFaceId),
        };
        if !self.faces.contains_key(&face_id) {
            match record {
                Some(record) if create => self.insert_face(&face_id, record.clone())?,
                _ => return Err(LedgerError::not_found(EntityKind::Face, &face_id)),
            }
        }
        self.faces
            .get(&face_id)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Face, &face_id))
    }

    pub fn face(&self, face_id: &str) -> Option<&Face> {
        self.faces.get(face_id)
    }

    /// Known face ids. With `refresh`, the whole collection is listed from
    /// the backend (every page) and replaces the in-memory faces.
    ///
    /// Listing finishes before anything is replaced, so a failed refresh
    /// leaves the current faces untouched. Confirmed faces are never lost: a
    /// confirmed face missing from the listing is kept along with its person.
    /// Indexed images drop ids that are gone and pick up newly listed faces.
    /// Cached search results do not survive.
    pub fn list_faces(&mut self, refresh: bool) -> Result<Vec<String>, LedgerError> {
        if refresh {
            let records = self.list_collection()?;
            let previous = std::mem::take(&mut self.faces);
            for record in records {
                if !self.faces.contains_key(&record.face_id) {
                    let face_id = record.face_id.clone();
                    self.insert_face(&face_id, record)?;
                }
            }
            let listed = self.faces.len();
            let kept = self.keep_unlisted_confirmed(previous);
            self.restore_confirmations();
            self.sync_image_faces();
            log::info!(
                "Refreshed faces of {}: {listed} listed, {kept} confirmed kept",
                self.collection_id
            );
        }
        Ok(sorted_keys(&self.faces))
    }

    /// Search hits for a face, similarity in [0, 1]. Cached after the first
    /// search; `refresh` searches again and replaces the cache.
    pub fn similar_faces(
        &mut self,
        face_id: &str,
        refresh: bool,
    ) -> Result<&[SimilarFace], LedgerError> {
        let cached = self.require_face(face_id)?.similar.is_populated();
        if refresh || !cached {
            let hits = self.search_faces(face_id)?;
            if let Some(face) = self.faces.get_mut(face_id) {
                face.similar.populate(hits);
            }
        } else {
            log::debug!("Similar faces of {face_id} served from cache");
        }
        Ok(self
            .faces
            .get(face_id)
            .and_then(Face::similar)
            .unwrap_or_default())
    }

    /// Who a face might be: its confirmed person at 1.0, or else the
    /// persons of its confirmed look-alikes scored by similarity.
    pub fn face_person(&mut self, face_id: &str) -> Result<Vec<PersonGuess>, LedgerError> {
        if self.require_face(face_id)?.person.is_none() {
            self.similar_faces(face_id, false)?;
        }
        let face = self.require_face(face_id)?;
        Ok(guess_persons(
            face.person(),
            face.similar().unwrap_or_default(),
            |id| self.faces.get(id).and_then(Face::person),
        ))
    }

    // ── Confirmation ─────────────────────────────────────────────────

    /// Records that `face_id` shows `name`. Both sides change together.
    ///
    /// Confirming a face again for the same person does nothing. Confirming
    /// it for someone else fails with [`LedgerError::Conflict`] and changes
    /// nothing.
    pub fn confirm(&mut self, face_id: &str, name: &str) -> Result<(), LedgerError> {
        let face = self
            .faces
            .get_mut(face_id)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Face, face_id))?;
        let person = self
            .persons
            .get_mut(name)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Person, name))?;

        match face.person.as_deref() {
            Some(confirmed) if confirmed == name => {
                log::debug!("Face {face_id} already confirmed as {name}");
                return Ok(());
            }
            Some(confirmed) => {
                return Err(LedgerError::Conflict {
                    face_id: face_id.to_string(),
                    confirmed: confirmed.to_string(),
                    requested: name.to_string(),
                })
            }
            None => {}
        }

        face.person = Some(name.to_string());
        person.faces.push(face_id.to_string());
        log::info!("Confirmed face {face_id} as {name}");
        Ok(())
    }

    /// Faces of a person, best first.
    ///
    /// Confirmed faces score 1.0. With `guess`, unconfirmed faces similar to
    /// the confirmed ones are ranked below them by average similarity; see
    /// [`rank_faces`]. `refresh` re-runs the searches of the confirmed faces.
    pub fn person_faces(
        &mut self,
        name: &str,
        guess: bool,
        refresh: bool,
    ) -> Result<Vec<ScoredFace>, LedgerError> {
        let confirmed = self
            .persons
            .get(name)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Person, name))?
            .faces
            .clone();

        let mut evidence = Vec::with_capacity(confirmed.len());
        if guess {
            for face_id in &confirmed {
                evidence.push(self.similar_faces(face_id, refresh)?.to_vec());
            }
        }

        let faces = &self.faces;
        Ok(rank_faces(&confirmed, &evidence, |id| {
            faces.get(id).is_some_and(|face| face.person.is_some())
        }))
    }

    // ── Collection lifecycle ─────────────────────────────────────────

    /// Creates the backing collection and returns its ARN.
    pub fn create_all(&mut self) -> Result<String, LedgerError> {
        let arn = self.backend.create_collection(&self.collection_id)?;
        log::info!("Created collection {} ({arn})", self.collection_id);
        Ok(arn)
    }

    /// Deletes the backing collection. In-memory state is kept.
    pub fn delete_all(&mut self) -> Result<(), LedgerError> {
        self.backend.delete_collection(&self.collection_id)?;
        log::info!("Deleted collection {}", self.collection_id);
        Ok(())
    }

    // ── Backend calls ────────────────────────────────────────────────

    fn index_faces(&mut self, url: &str) -> Result<Vec<String>, LedgerError> {
        let location = ImageLocation {
            bucket: &self.bucket,
            name: url,
        };
        let records = self
            .backend
            .detect(&self.collection_id, location, url, true)?;
        log::debug!("Detected {} faces in {url}", records.len());

        let mut face_ids = Vec::with_capacity(records.len());
        for record in &records {
            face_ids.push(self.get_face(None, Some(record), true)?.face_id().to_string());
        }
        Ok(face_ids)
    }

    fn search_faces(&mut self, face_id: &str) -> Result<Vec<SimilarFace>, LedgerError> {
        let hits = self.backend.search(&self.collection_id, face_id)?;
        log::debug!("Search for {face_id} returned {} matches", hits.len());

        let mut similar = Vec::with_capacity(hits.len());
        for hit in &hits {
            let face = self.get_face(None, Some(&hit.face), true)?;
            similar.push(SimilarFace {
                face_id: face.face_id().to_string(),
                similarity: hit.similarity / SIMILARITY_SCALE,
            });
        }
        Ok(similar)
    }

    fn list_collection(&mut self) -> Result<Vec<FaceRecord>, LedgerError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .backend
                .list_faces(&self.collection_id, page_token.as_deref())?;
            log::debug!("Listed page of {} faces", page.faces.len());
            records.extend(page.faces);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(records),
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn insert_face(&mut self, face_id: &str, record: FaceRecord) -> Result<(), LedgerError> {
        let image_url = record.external_image_id.clone();
        self.get_image(&image_url, true)?;
        self.faces
            .insert(face_id.to_string(), Face::new(face_id, record, &image_url));
        log::debug!("Registered face {face_id} from {image_url}");
        Ok(())
    }

    fn require_face(&self, face_id: &str) -> Result<&Face, LedgerError> {
        self.faces
            .get(face_id)
            .ok_or_else(|| LedgerError::not_found(EntityKind::Face, face_id))
    }

    /// Puts back confirmed faces a refresh no longer lists. Returns how
    /// many were kept.
    fn keep_unlisted_confirmed(&mut self, previous: HashMap<String, Face>) -> usize {
        let mut kept = 0;
        for (face_id, mut face) in previous {
            if self.faces.contains_key(&face_id) {
                continue;
            }
            let Some(name) = face.person.as_deref() else {
                continue;
            };
            log::warn!("Face {face_id} confirmed as {name} is no longer listed; keeping it");
            face.similar = LazyCache::Unpopulated;
            self.faces.insert(face_id, face);
            kept += 1;
        }
        kept
    }

    fn restore_confirmations(&mut self) {
        for person in self.persons.values() {
            for face_id in &person.faces {
                if let Some(face) = self.faces.get_mut(face_id) {
                    face.person = Some(person.name().to_string());
                }
            }
        }
    }

    /// Aligns the face lists of indexed images with the face map.
    fn sync_image_faces(&mut self) {
        let mut listed: Vec<(&String, &Face)> = self.faces.iter().collect();
        listed.sort_by(|a, b| a.0.cmp(b.0));
        let mut by_image: HashMap<&str, Vec<&str>> = HashMap::new();
        for (face_id, face) in listed {
            by_image
                .entry(face.image_url())
                .or_default()
                .push(face_id.as_str());
        }
        for image in self.images.values_mut() {
            let found = by_image.get(image.url()).cloned().unwrap_or_default();
            if let Some(face_ids) = image.faces.get_mut() {
                face_ids.retain(|id| found.contains(&id.as_str()));
                for id in found {
                    if !face_ids.iter().any(|known| known == id) {
                        face_ids.push(id.to_string());
                    }
                }
            }
        }
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
