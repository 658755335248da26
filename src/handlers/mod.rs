// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (JWT auth + per-endpoint role allow-list)
pub mod protected; // /api/*, behind jwt_auth_middleware
pub mod public; // /, /health
