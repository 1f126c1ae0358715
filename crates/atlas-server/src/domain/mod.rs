pub mod models;
pub mod permission;
