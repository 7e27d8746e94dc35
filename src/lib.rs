//! Refine web-search candidates for a cited work into at most one Primary
//! URL (the work itself) and one Secondary URL (a review or discussion).

pub mod config;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod models;
pub mod ranker;
pub mod selector;
pub mod utils;
pub mod validator;

pub use engine::RefinementEngine;
pub use errors::RefineError;
