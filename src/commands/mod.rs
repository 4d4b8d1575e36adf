pub mod analyses;
pub mod auth;
pub mod blog;
pub mod settings;
