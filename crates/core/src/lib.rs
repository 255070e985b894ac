#![forbid(unsafe_code)]

//! Domain model and pure algorithms for elaborative interrogation sessions.
//!
//! Nothing in this crate performs I/O: question generation, response
//! evaluation and statistics aggregation are deterministic functions over
//! the types in [`model`].

pub mod error;
pub mod evaluator;
pub mod generator;
pub mod model;
pub mod scoring;
pub mod statistics;
pub mod time;

pub use error::Error;
pub use evaluator::evaluate_response;
pub use generator::generate_questions;
pub use statistics::aggregate;
pub use time::Clock;
