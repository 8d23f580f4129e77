//! Advisor search filter validation and document store cost monitoring

mod app;
pub mod core;
pub mod domain;
pub mod utils;
