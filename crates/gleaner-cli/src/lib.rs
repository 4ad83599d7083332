pub mod engine;

pub use engine::{Engine, build_engine};
