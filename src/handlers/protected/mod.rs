// handlers/protected/mod.rs - handlers behind jwt_auth_middleware
//
// Every handler takes the verified `Principal` and calls `authorize` against
// the static allow-list for its resource and action before touching the
// store. Mutating handlers append one audit entry after a successful write.

pub mod admin;
pub mod dashboard;
pub mod groups;
pub mod loans;
pub mod persons;
