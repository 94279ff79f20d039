pub mod hash;
pub mod store;

pub use hash::compute_content_hash;
pub use store::{is_stale, MetadataCache, SENTINEL_FILE};
