pub mod recorded_backend;
