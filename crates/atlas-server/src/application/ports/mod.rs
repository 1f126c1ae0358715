pub mod auth;
pub mod repositories;
pub mod selection;
