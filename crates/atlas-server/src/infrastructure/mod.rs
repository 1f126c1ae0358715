pub mod auth;
pub mod connection;
pub mod di_container;
pub mod persistence;
pub mod selection;
