/// Round-robin story assignment engine.
pub mod assignment;
/// Token issuance and session resolution.
pub mod auth;
/// Join-code generation.
pub mod codes;
/// Round completion detection and the per-party check registry.
pub mod completion;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Party creation, join boundary, and status.
pub mod party_service;
/// Player-scoped operations.
pub mod player_service;
/// Round lifecycle orchestration.
pub mod round_service;
/// Storage connection supervisor with degraded mode.
pub mod storage_supervisor;
