// Web Interface module root
pub mod routes;
pub mod token_issuer;
pub mod types;
pub mod user_directory;
pub mod web_server;

// Re-export commonly used items
pub use routes::{api_routes, handle_rejection};
pub use token_issuer::TokenIssuer;
pub use user_directory::UserDirectory;
pub use web_server::MockServer;

#[cfg(test)]
mod tests;
