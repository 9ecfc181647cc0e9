pub mod checkpoint;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod runner;
pub mod score;

pub use error::{Error, Result};
