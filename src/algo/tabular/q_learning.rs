use std::collections::HashMap;

use rand::{seq::SliceRandom, thread_rng};

use crate::{
    agent::Agent,
    ds::ValueTable,
    ensure_interval,
    env::{DiscreteActionSpace, Environment},
    exp::Exp,
    Error, Result,
};

use super::{greedy, Hashable};

/// Configuration for the [`QLearningAgent`]
#[derive(Debug, Clone)]
pub struct QLearningAgentConfig {
    /// Learning rate, the weight given to each new sample - must be in `(0,1]`
    ///
    /// **Default**: `0.2`
    pub alpha: f32,
    /// Discount factor for future reward - must be in `(0,1]`
    ///
    /// **Default**: `0.9`
    pub gamma: f32,
}

impl Default for QLearningAgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            gamma: 0.9,
        }
    }
}

impl QLearningAgentConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_interval!(self.alpha, 0.0, 1.0);
        ensure_interval!(self.gamma, 0.0, 1.0);
        Ok(())
    }
}

/// A model-free Q-learning agent that learns from uniformly random single steps
///
/// Each training step samples one random transition `(s, a, r, s')` from the agent's own
/// environment and blends it into the table:
///
/// Q(s,a) ← (1 - α) Q(s,a) + α (r + γ max<sub>a'</sub> Q(s',a'))
///
/// Unlike [`ValueIterationAgent`](super::value_iteration::ValueIterationAgent) it never
/// enumerates the state space, only the states it actually visits.
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The action space must be discrete and fixed, because a Q value is recorded for each state action pair
///     - The state and action types must be [`Hashable`] to be used as table keys
pub struct QLearningAgent<E>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    env: E,
    state: E::State,
    actions: Vec<E::Action>,
    q_table: ValueTable<(E::State, E::Action)>,
    alpha: f32, // learning rate
    gamma: f32, // discount factor
}

impl<E> QLearningAgent<E>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    /// Initialize a new `QLearningAgent` that gathers experience from `env`
    ///
    /// `env` is reset immediately. Fails if the configuration is out of range or the
    /// environment reports no actions.
    pub fn new(mut env: E, config: QLearningAgentConfig) -> Result<Self> {
        config.validate()?;
        let actions = env.actions();
        if actions.is_empty() {
            return Err(Error::NoActions);
        }
        let state = env.reset()?;
        Ok(Self {
            env,
            state,
            actions,
            q_table: ValueTable::new(),
            alpha: config.alpha,
            gamma: config.gamma,
        })
    }

    pub fn q_table(&self) -> &ValueTable<(E::State, E::Action)> {
        &self.q_table
    }

    /// The training environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Take one uniformly random action from the tracked state
    ///
    /// The tracked state advances to the next state, or back to an initial state if the
    /// episode ended.
    pub fn sample_env(&mut self) -> Result<Exp<E>> {
        let action = *self
            .actions
            .choose(&mut thread_rng())
            .expect("action set is checked non-empty on construction");
        let state = self.state;
        let step = self.env.step(action)?;
        self.state = if step.done {
            self.env.reset()?
        } else {
            step.next_state
        };

        Ok(Exp {
            state,
            action,
            reward: step.reward,
            next_state: step.next_state,
            done: step.done,
        })
    }

    /// Find the action with the largest Q value in `state`
    ///
    /// Ties, including the all-zero table, go to the first action in enumeration order.
    ///
    /// **Returns** `(value, action)`
    pub fn best_value_and_action(&self, state: E::State) -> (f32, E::Action) {
        let (action, value) = greedy(&self.actions, |a| self.q_table.get(&(state, a)))
            .expect("action set is checked non-empty on construction");
        (value, action)
    }

    /// Blend one observed transition into the Q table
    ///
    /// **Returns** the new value of `Q(state, action)`
    pub fn value_update(
        &mut self,
        state: E::State,
        action: E::Action,
        reward: f32,
        next_state: E::State,
    ) -> f32 {
        let (best_next, _) = self.best_value_and_action(next_state);
        let target = reward + self.gamma * best_next;
        let q_value = self.q_table.get(&(state, action));
        let blended = (1.0 - self.alpha) * q_value + self.alpha * target;

        self.q_table.set((state, action), blended);
        blended
    }

    /// Play one greedy episode in `env` without touching the Q table
    ///
    /// **Returns** the total reward
    pub fn play_episode(&self, env: &mut E) -> Result<f32> {
        let mut total_reward = 0.0;
        let mut state = env.reset()?;
        loop {
            let (_, action) = self.best_value_and_action(state);
            let step = env.step(action)?;
            total_reward += step.reward;
            if step.done {
                break;
            }
            state = step.next_state;
        }
        Ok(total_reward)
    }

    /// The greedy action for each of the given states
    pub fn policy(&self, states: impl IntoIterator<Item = E::State>) -> HashMap<E::State, E::Action> {
        states
            .into_iter()
            .map(|s| (s, self.best_value_and_action(s).1))
            .collect()
    }
}

impl<E> Agent<E> for QLearningAgent<E>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable,
    E::Action: Hashable,
{
    fn improve(&mut self) -> Result<()> {
        let Exp {
            state,
            action,
            reward,
            next_state,
            ..
        } = self.sample_env()?;
        self.value_update(state, action, reward, next_state);
        Ok(())
    }

    fn play_episode(&mut self, env: &mut E) -> Result<f32> {
        QLearningAgent::play_episode(self, env)
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use rand::Rng;

    use super::*;
    use crate::env::tests::MockEnv;

    fn agent(env: MockEnv) -> QLearningAgent<MockEnv> {
        QLearningAgent::new(env, QLearningAgentConfig::default()).unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(QLearningAgentConfig::default().validate().is_ok());

        let config = QLearningAgentConfig {
            alpha: 1.0,
            gamma: 1.0,
        };
        assert!(config.validate().is_ok(), "Upper bound is inclusive");

        for (alpha, gamma) in [(0.0, 0.9), (0.2, 0.0), (1.5, 0.9), (0.2, -0.1)] {
            let config = QLearningAgentConfig { alpha, gamma };
            assert!(
                matches!(
                    QLearningAgent::new(MockEnv::reward_chain(), config),
                    Err(Error::InvalidConfig(_))
                ),
                "alpha {alpha}, gamma {gamma} rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_action_set() {
        let env = MockEnv::new(1, 0, |_, _| (0, 0.0, true));
        assert!(matches!(
            QLearningAgent::new(env, QLearningAgentConfig::default()),
            Err(Error::NoActions)
        ));
    }

    #[test]
    fn best_action_first_wins_on_ties() {
        let mut agent = agent(MockEnv::new(3, 4, |_, _| (0, 0.0, true)));
        for state in 0..3 {
            assert_eq!(
                agent.best_value_and_action(state),
                (0.0, 0),
                "Empty table picks first action"
            );
        }

        agent.q_table.set((1, 2), 0.5);
        agent.q_table.set((1, 3), 0.5);
        assert_eq!(agent.best_value_and_action(1), (0.5, 2));

        agent.q_table.set((2, 0), -1.0);
        assert_eq!(
            agent.best_value_and_action(2),
            (0.0, 1),
            "Negative value loses to default zero"
        );
    }

    #[test]
    fn value_update_blends() {
        let mut agent = agent(MockEnv::reward_chain());

        // target = 1 + 0.9 * 0, new = 0.8 * 0 + 0.2 * 1
        let q = agent.value_update(0, 1, 1.0, 1);
        assert_float_eq!(q, 0.2, abs <= 1e-6);

        // next state 0 best value is 0.2 via action 1
        let q = agent.value_update(1, 1, 1.0, 0);
        assert_float_eq!(q, 0.2 * (1.0 + 0.9 * 0.2), abs <= 1e-6);

        let q = agent.value_update(0, 1, 1.0, 1);
        let expected = 0.8 * 0.2 + 0.2 * (1.0 + 0.9 * 0.236);
        assert_float_eq!(q, expected, abs <= 1e-6);
        assert_eq!(agent.q_table().get(&(0, 1)), q);
        assert_eq!(agent.q_table().get(&(0, 0)), 0.0);
    }

    #[test]
    fn value_update_stays_between_old_value_and_target() {
        let mut rng = rand::thread_rng();
        let mut agent = agent(MockEnv::new(5, 3, |_, _| (0, 0.0, true)));
        for _ in 0..1000 {
            let (s, a, next) = (rng.gen_range(0..5), rng.gen_range(0..3), rng.gen_range(0..5));
            let reward = rng.gen_range(-1.0..1.0);

            let old = agent.q_table().get(&(s, a));
            let target = reward + 0.9 * agent.best_value_and_action(next).0;
            let new = agent.value_update(s, a, reward, next);

            let (lo, hi) = (old.min(target), old.max(target));
            assert!(
                new >= lo - 1e-5 && new <= hi + 1e-5,
                "{new} outside [{lo}, {hi}]"
            );
        }
    }

    #[test]
    fn sample_env_tracks_state() {
        let mut agent = agent(MockEnv::reward_chain());
        let mut expected_state = 0;
        for _ in 0..50 {
            let exp = agent.sample_env().unwrap();
            assert_eq!(exp.state, expected_state, "Transition starts at tracked state");
            assert_eq!(exp.next_state, exp.action, "Chain moves to the action's state");
            assert!(!exp.done);
            expected_state = exp.next_state;
        }
        assert_eq!(agent.env().steps, 50);
    }

    #[test]
    fn sample_env_resets_on_done() {
        let mut agent = agent(MockEnv::always_succeed());
        assert_eq!(agent.env().resets, 1, "Reset on construction");
        let exp = agent.sample_env().unwrap();
        assert!(exp.done);
        assert_eq!(exp.reward, 1.0);
        assert_eq!(agent.env().resets, 2, "Reset after terminal step");
    }

    #[test]
    fn play_episode_is_read_only() {
        let mut agent = agent(MockEnv::reward_chain());
        for _ in 0..20 {
            agent.improve().unwrap();
        }
        let table = agent.q_table().clone();
        let training_steps = agent.env().steps;

        let mut eval_env = MockEnv::always_succeed();
        let reward = QLearningAgent::play_episode(&agent, &mut eval_env).unwrap();
        assert_eq!(reward, 1.0);
        assert_eq!(agent.q_table(), &table, "Q table unchanged");
        assert_eq!(agent.env().steps, training_steps, "Training env untouched");
        assert_eq!(eval_env.steps, 1);
    }

    #[test]
    fn evaluate_averages_episodes() {
        let mut agent = agent(MockEnv::always_succeed());
        let mut eval_env = MockEnv::always_succeed();
        assert_eq!(agent.evaluate(&mut eval_env, 20).unwrap(), 1.0);
        assert_eq!(eval_env.resets, 20);
    }

    #[test]
    fn learns_reward_chain_policy() {
        let mut agent = agent(MockEnv::reward_chain());
        for _ in 0..2000 {
            agent.improve().unwrap();
        }
        let policy = agent.policy([0, 1]);
        assert_eq!(policy[&0], 1);
        assert_eq!(policy[&1], 1);
    }

    #[test]
    fn environment_failure_propagates() {
        let mut agent = agent(MockEnv::reward_chain().failing_after(3));
        for _ in 0..3 {
            agent.improve().unwrap();
        }
        assert!(matches!(agent.improve(), Err(Error::Environment(_))));
    }
}
