pub mod auth;
pub mod response;

pub use auth::identity_middleware;
pub use response::{envelope_rejections, ApiResponse, ApiResult};
