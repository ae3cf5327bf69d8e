pub mod api_client;
pub use api_client::*;

pub mod configuration;

pub mod data_validation;
pub use data_validation::*;

pub mod error_handling;

pub mod models;

pub mod services;
pub use services::*;

pub mod session_management;
pub use session_management::*;

pub mod token_management;
pub use token_management::*;

pub mod web_interface;
