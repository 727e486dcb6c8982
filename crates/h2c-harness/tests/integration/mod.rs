//! Shared setup for end-to-end tests against a real h2c binary

pub mod get_post;
pub mod utils;
