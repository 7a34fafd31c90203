//! Core data models for the file store.
//!
//! `StoredObject` mirrors what the bucket knows about an object, `UploadedFile`
//! is what a multipart request hands us, and `FileData` is what we send back.

pub mod file_data;
pub mod multipart;
pub mod stored_object;
