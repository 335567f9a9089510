/// The backend reports similarity as a percentage; the ledger works in [0, 1].
pub const SIMILARITY_SCALE: f64 = 100.0;

/// Score assigned to a face an operator has confirmed.
pub const CONFIRMED_SCORE: f64 = 1.0;

pub const DEFAULT_COLLECTION_ID: &str = "face-ledger";
pub const DEFAULT_BUCKET: &str = "face-ledger-images";

/// Faces per listing page when a recording doesn't say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 4096;
