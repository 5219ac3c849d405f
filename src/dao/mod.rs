/// Entity definitions shared across layers.
pub mod models;
/// Store trait and its backends.
pub mod party_store;
/// Backend-agnostic storage errors.
pub mod storage;
