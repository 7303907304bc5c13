/// Table-based algorithms for small discrete environments
pub mod tabular;

pub use tabular::{
    q_learning::{QLearningAgent, QLearningAgentConfig},
    value_iteration::{ValueIterationAgent, ValueIterationAgentConfig},
};
