//! Typed wrappers over `ApiClient`, one per backend resource.
//!
//! Every wrapper is a cheap clone around the shared client, so they all see
//! the same session and the same token guard.

pub mod admin;
pub mod auth;
pub mod competitions;
pub mod notifications;
pub mod project_types;
pub mod projects;
pub mod students;
pub mod teachers;
pub mod users;

pub use admin::AdminService;
pub use auth::{AuthService, LoginOutcome};
pub use competitions::CompetitionService;
pub use notifications::NotificationService;
pub use project_types::ProjectTypeService;
pub use projects::ProjectService;
pub use students::StudentService;
pub use teachers::TeacherService;
pub use users::UserService;

/// Query string pairs, in the order they are sent.
pub type Query = Vec<(String, String)>;

/// Builds a `Query` from borrowed pairs, dropping empty values.
pub fn query(pairs: &[(&str, &str)]) -> Query {
    pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests;
