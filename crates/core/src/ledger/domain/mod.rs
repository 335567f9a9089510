pub mod face;
pub mod image;
pub mod ledger_error;
pub mod person;
