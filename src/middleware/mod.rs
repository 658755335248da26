pub mod auth;
pub mod json;
pub mod origin;
pub mod path;
pub mod response;

pub use auth::jwt_auth_middleware;
pub use json::ApiJson;
pub use origin::ClientOrigin;
pub use path::ApiPath;
pub use response::{ApiResponse, ApiResult};
