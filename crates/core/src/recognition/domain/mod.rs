pub mod face_record;
pub mod recognition_backend;
