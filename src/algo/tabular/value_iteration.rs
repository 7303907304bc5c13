use std::collections::HashMap;

use log::debug;
use rand::{seq::SliceRandom, thread_rng};

use crate::{
    agent::Agent,
    ds::{TransitionTable, ValueTable},
    ensure_interval, ensure_positive,
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment},
    Error, Result,
};

use super::{greedy, Hashable};

/// Configuration for the [`ValueIterationAgent`]
#[derive(Debug, Clone)]
pub struct ValueIterationAgentConfig {
    /// Discount factor for future reward - must be in `(0,1]`
    ///
    /// **Default**: `0.9`
    pub gamma: f32,
    /// Number of random steps gathered before each sweep
    ///
    /// **Default**: `100`
    pub random_steps: usize,
}

impl Default for ValueIterationAgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            random_steps: 100,
        }
    }
}

impl ValueIterationAgentConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_interval!(self.gamma, 0.0, 1.0);
        ensure_positive!(self.random_steps);
        Ok(())
    }
}

/// A model-based agent that estimates the environment's dynamics and solves them with value iteration
///
/// Random experience is folded into two tables: the last reward seen for every
/// `(s, a, s')` triple, and how often each `s'` followed `(s, a)`. The counts give empirical
/// transition probabilities, and each sweep applies the Bellman backup
///
/// V(s) ← max<sub>a</sub> Σ<sub>s'</sub> p(s'|s,a) (R(s,a,s') + γ V(s'))
///
/// to every state of the environment. The full state space must therefore be small, discrete,
/// and enumerable.
///
/// Evaluation episodes are recorded into the same tables, so every observed transition
/// improves the model.
pub struct ValueIterationAgent<E>
where
    E: Environment + DiscreteActionSpace + DiscreteStateSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    env: E,
    state: E::State,
    actions: Vec<E::Action>,
    states: Vec<E::State>,
    rewards: ValueTable<(E::State, E::Action, E::State)>,
    transits: TransitionTable<E::State, E::Action>,
    values: ValueTable<E::State>,
    gamma: f32,
    random_steps: usize,
}

impl<E> ValueIterationAgent<E>
where
    E: Environment + DiscreteActionSpace + DiscreteStateSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    /// Initialize a new `ValueIterationAgent` that gathers experience from `env`
    ///
    /// `env` is reset immediately. Fails if the configuration is out of range or the
    /// environment reports no actions or no states.
    pub fn new(mut env: E, config: ValueIterationAgentConfig) -> Result<Self> {
        config.validate()?;
        let actions = env.actions();
        if actions.is_empty() {
            return Err(Error::NoActions);
        }
        let states = env.states();
        if states.is_empty() {
            return Err(Error::NoStates);
        }
        let state = env.reset()?;
        Ok(Self {
            env,
            state,
            actions,
            states,
            rewards: ValueTable::new(),
            transits: TransitionTable::new(),
            values: ValueTable::new(),
            gamma: config.gamma,
            random_steps: config.random_steps,
        })
    }

    /// Record a transition in both the reward and the transition table
    ///
    /// The reward is overwritten; the count accumulates.
    fn observe(&mut self, state: E::State, action: E::Action, reward: f32, next_state: E::State) {
        self.rewards.set((state, action, next_state), reward);
        self.transits.record(state, action, next_state);
    }

    /// Take `count` uniformly random actions in the training environment, recording each
    /// transition
    pub fn play_n_random_steps(&mut self, count: usize) -> Result<()> {
        let mut rng = thread_rng();
        for _ in 0..count {
            let action = *self
                .actions
                .choose(&mut rng)
                .expect("action set is checked non-empty on construction");
            let step = self.env.step(action)?;
            self.observe(self.state, action, step.reward, step.next_state);
            self.state = if step.done {
                self.env.reset()?
            } else {
                step.next_state
            };
        }
        Ok(())
    }

    /// Expected return of taking `action` in `state` under the estimated model
    ///
    /// A pair that has never been executed has no estimated outcomes and is worth `0.0`.
    pub fn calc_action_value(&self, state: E::State, action: E::Action) -> f32 {
        let total = self.transits.total(state, action) as f32;
        self.transits
            .targets(state, action)
            .map(|(next_state, count)| {
                let reward = self.rewards.get(&(state, action, next_state));
                let ret = reward + self.gamma * self.values.get(&next_state);
                (count as f32 / total) * ret
            })
            .sum()
    }

    /// The action with the largest estimated value in `state`
    ///
    /// Ties go to the first action in enumeration order.
    pub fn select_action(&self, state: E::State) -> E::Action {
        greedy(&self.actions, |a| self.calc_action_value(state, a))
            .expect("action set is checked non-empty on construction")
            .0
    }

    /// Sweep every state once, setting its value to the best action value
    ///
    /// States are updated in place, so later states in the sweep already see the new values
    /// of earlier ones.
    ///
    /// **Returns** the largest absolute change of any state value
    pub fn value_iteration(&mut self) -> f32 {
        let mut delta = 0.0_f32;
        for i in 0..self.states.len() {
            let state = self.states[i];
            let (_, new_value) = greedy(&self.actions, |a| self.calc_action_value(state, a))
                .expect("action set is checked non-empty on construction");
            let old_value = self.values.set(state, new_value);
            delta = delta.max((old_value - new_value).abs());
        }
        delta
    }

    /// Play one greedy episode in `env`, recording every transition into the model
    ///
    /// **Returns** the total reward
    pub fn play_episode(&mut self, env: &mut E) -> Result<f32> {
        let mut total_reward = 0.0;
        let mut state = env.reset()?;
        loop {
            let action = self.select_action(state);
            let step = env.step(action)?;
            self.observe(state, action, step.reward, step.next_state);
            total_reward += step.reward;
            if step.done {
                break;
            }
            state = step.next_state;
        }
        Ok(total_reward)
    }

    /// Get the agent's state value function
    pub fn state_values(&self) -> &ValueTable<E::State> {
        &self.values
    }

    /// Get the last observed reward for every `(s, a, s')` triple
    pub fn rewards(&self) -> &ValueTable<(E::State, E::Action, E::State)> {
        &self.rewards
    }

    /// Get the transition counts
    pub fn transits(&self) -> &TransitionTable<E::State, E::Action> {
        &self.transits
    }

    /// Get the greedy policy over the full state space
    pub fn policy(&self) -> HashMap<E::State, E::Action> {
        self.states
            .iter()
            .map(|&s| (s, self.select_action(s)))
            .collect()
    }

    /// The training environment
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E> Agent<E> for ValueIterationAgent<E>
where
    E: Environment + DiscreteActionSpace + DiscreteStateSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    fn improve(&mut self) -> Result<()> {
        self.play_n_random_steps(self.random_steps)?;
        let delta = self.value_iteration();
        debug!("Value iteration sweep, max change {:.6}", delta);
        Ok(())
    }

    fn play_episode(&mut self, env: &mut E) -> Result<f32> {
        ValueIterationAgent::play_episode(self, env)
    }
}
