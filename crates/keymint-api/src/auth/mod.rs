// Authentication module
// Decision: Pluggable strategies (password, Google) behind one dispatch point
// Decision: Scoped tokens: an API key selects the scopes a session carries

pub mod api_key;
pub mod config;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod routes;
pub mod session;
pub mod strategy;

pub use config::AuthConfig;
pub use middleware::AuthState;
pub use routes::routes;
