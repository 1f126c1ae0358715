pub mod assets;
pub mod bulk;
pub mod catalog;
pub mod health;
