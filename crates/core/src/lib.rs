//! Identity bookkeeping over a stateless face recognition service.
//!
//! The backend can detect faces in stored images and search for similar
//! faces, but it cannot remember who anyone is. [`ledger::face_database`]
//! keeps that memory: which images were submitted, which faces came back,
//! which faces an operator confirmed as which person, and ranked guesses for
//! the rest.

pub mod ledger;
pub mod recognition;
pub mod shared;
