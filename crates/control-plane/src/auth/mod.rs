// Request authentication for the /api/v1 surface

pub mod middleware;
pub mod routes;

pub use middleware::{auth_request_from_headers, require_identity, CurrentIdentity};
pub use routes::routes;
