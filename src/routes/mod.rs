//! REST API route handlers.

pub mod execute;
pub mod health;
pub mod problems;
pub mod sessions;
