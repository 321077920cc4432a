pub mod classify;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod pipeline;
pub mod store;

pub use pipeline::{run, run_with, RunRequest};
