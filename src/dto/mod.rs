/// Health check payloads.
pub mod health;
/// Party creation, join, and status payloads.
pub mod party;
/// Player-scoped payloads.
pub mod player;
/// Round lifecycle payloads.
pub mod round;
/// Hand-written request validators.
pub mod validation;
