pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{Claims, JwtService};
pub use middleware::{auth_middleware, resolve_session, AuthState};
pub use models::SessionContext;
