//! Real store implementations

pub mod artifact_store;
pub mod file_system;
pub mod firestore;
pub mod firestore_codec;

#[cfg(test)]
pub mod tests;

pub use artifact_store::GcsArtifactStore;
pub use file_system::LocalArtifactStore;
pub use firestore::FirestoreRecordStore;
