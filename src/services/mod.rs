pub mod cdn;
pub mod file_service;
pub mod naming;
pub mod object_store;
