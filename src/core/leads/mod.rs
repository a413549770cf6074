pub mod auth;
pub mod cell;
pub mod dispatch;
pub mod distribution;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod operations;
pub mod queue;
pub mod seed;
pub mod stats;
pub mod types;

pub use operations::{EngineSettings, ImportSource, Operations};
