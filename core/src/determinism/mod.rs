pub mod content_hash;
pub mod ids;
