pub mod domain;
pub mod face_database;
