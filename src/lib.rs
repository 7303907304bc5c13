/// The training contract shared by every strategy
pub mod agent;

/// Implemented RL algorithms
pub mod algo;

/// Data structures
pub mod ds;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Observed transitions
pub mod exp;

/// Sinks for training metrics
pub mod metrics;

/// Training loop
pub mod trainer;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

mod util;

pub use error::{Error, Result};
