use crate::Result;

/// The outcome of a single environment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<S> {
    /// The state reached after the action is taken
    pub next_state: S,
    /// The immediate reward for the transition
    pub reward: f32,
    /// Whether the episode ended with this transition
    pub done: bool,
}

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// The environment is an external simulator: the agents in this crate only ever
/// reset it and step it. Any failure it reports is treated as fatal to a training run.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** the next state, the reward, and whether the episode is done
    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Result<Self::State>;
}

/// An environment with a finite action set shared by every state
pub trait DiscreteActionSpace: Environment {
    /// Get every action, in a stable enumeration order
    ///
    /// The returned list should never be empty and must be identical across calls.
    fn actions(&self) -> Vec<Self::Action>;
}

/// An environment whose full state space is finite and enumerable
pub trait DiscreteStateSpace: Environment {
    /// Get every state, in a stable enumeration order
    fn states(&self) -> Vec<Self::State>;
}
