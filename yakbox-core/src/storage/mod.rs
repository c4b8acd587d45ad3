pub mod metadata;
pub mod recording_store;
