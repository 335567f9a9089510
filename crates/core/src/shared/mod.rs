pub mod constants;
pub mod lazy_cache;
