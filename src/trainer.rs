use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, info};

use crate::{agent::Agent, ensure_positive, env::Environment, metrics::MetricsSink, Result};

/// Configuration for the [`Trainer`]
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of evaluation episodes averaged per iteration - must be greater than zero
    ///
    /// **Default**: `20`
    pub test_episodes: usize,
    /// Average evaluation reward that must be exceeded to consider the task solved
    ///
    /// **Default**: `0.8`
    pub solved_reward: f32,
    /// Stop with [`TrainOutcome::NotConverged`] after this many iterations
    ///
    /// **Default**: `None`, train until solved
    pub max_iterations: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_episodes: 20,
            solved_reward: 0.8,
            max_iterations: None,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_positive!(self.test_episodes);
        Ok(())
    }
}

/// How a training run ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// The average evaluation reward exceeded the solved threshold
    Solved { iterations: u64, reward: f32 },
    /// The iteration cap was reached first
    NotConverged { iterations: u64, best_reward: f32 },
    /// The cancellation flag was raised
    Cancelled { iterations: u64, best_reward: f32 },
}

impl TrainOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }

    /// Number of completed iterations
    pub fn iterations(&self) -> u64 {
        match *self {
            Self::Solved { iterations, .. }
            | Self::NotConverged { iterations, .. }
            | Self::Cancelled { iterations, .. } => iterations,
        }
    }
}

/// Drives an [`Agent`] through collect, update, and evaluate iterations until a stop condition holds
///
/// Each iteration records the average evaluation reward under the `"reward"` series. The best
/// average seen so far only ever increases and is logged whenever it does.
pub struct Trainer {
    config: TrainerConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Stop the run before the next iteration once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Train `agent`, evaluating it on `eval_env`
    ///
    /// `eval_env` must be a different instance from the one the agent collects experience
    /// from. Any environment or sink error aborts the run. The sink is closed once the run
    /// ends with an outcome.
    pub fn run<E, A, M>(&self, agent: &mut A, eval_env: &mut E, sink: &mut M) -> Result<TrainOutcome>
    where
        E: Environment,
        A: Agent<E>,
        M: MetricsSink,
    {
        let mut iterations = 0;
        let mut best_reward = 0.0;

        let outcome = loop {
            if self.cancelled() {
                info!("Training cancelled after {} iterations", iterations);
                break TrainOutcome::Cancelled {
                    iterations,
                    best_reward,
                };
            }
            if self
                .config
                .max_iterations
                .is_some_and(|max| iterations >= max)
            {
                info!(
                    "Not solved after {} iterations, best reward {:.3}",
                    iterations, best_reward
                );
                break TrainOutcome::NotConverged {
                    iterations,
                    best_reward,
                };
            }

            iterations += 1;
            let reward = agent.train_one_iteration(eval_env, self.config.test_episodes)?;
            sink.record("reward", reward, iterations)?;
            debug!("Iteration {}: reward {:.3}", iterations, reward);

            if reward > best_reward {
                info!("Best reward updated {:.3} -> {:.3}", best_reward, reward);
                best_reward = reward;
            }
            if reward > self.config.solved_reward {
                info!("Solved in {} iterations!", iterations);
                break TrainOutcome::Solved { iterations, reward };
            }
        };

        sink.close()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algo::{
            QLearningAgent, QLearningAgentConfig, ValueIterationAgent, ValueIterationAgentConfig,
        },
        env::tests::MockEnv,
        metrics::MemorySink,
        Error,
    };

    /// Reports a scripted sequence of evaluation rewards
    struct ScriptedAgent {
        rewards: Vec<f32>,
        i: usize,
        improved: usize,
    }

    impl ScriptedAgent {
        fn new(rewards: &[f32]) -> Self {
            Self {
                rewards: rewards.to_vec(),
                i: 0,
                improved: 0,
            }
        }
    }

    impl Agent<MockEnv> for ScriptedAgent {
        fn improve(&mut self) -> Result<()> {
            self.improved += 1;
            Ok(())
        }

        fn play_episode(&mut self, _env: &mut MockEnv) -> Result<f32> {
            unreachable!("evaluation is scripted")
        }

        fn evaluate(&mut self, _env: &mut MockEnv, _episodes: usize) -> Result<f32> {
            let reward = self.rewards[self.i % self.rewards.len()];
            self.i += 1;
            Ok(reward)
        }
    }

    fn trainer(max_iterations: Option<u64>) -> Trainer {
        Trainer::new(TrainerConfig {
            max_iterations,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn config_validation() {
        let config = TrainerConfig {
            test_episodes: 0,
            ..Default::default()
        };
        assert!(matches!(Trainer::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn q_learning_solves_trivial_env() {
        let mut agent =
            QLearningAgent::new(MockEnv::always_succeed(), QLearningAgentConfig::default())
                .unwrap();
        let mut eval_env = MockEnv::always_succeed();
        let mut sink = MemorySink::new();

        let outcome = trainer(None).run(&mut agent, &mut eval_env, &mut sink).unwrap();

        assert_eq!(
            outcome,
            TrainOutcome::Solved {
                iterations: 1,
                reward: 1.0
            }
        );
        assert_eq!(sink.series("reward"), &[(1, 1.0)]);
        assert!(sink.is_closed());
        assert_eq!(eval_env.steps, 20, "One step per evaluation episode");
        assert_eq!(agent.env().steps, 1, "One training step");
    }

    #[test]
    fn value_iteration_solves_trivial_env() {
        let mut agent = ValueIterationAgent::new(
            MockEnv::always_succeed(),
            ValueIterationAgentConfig::default(),
        )
        .unwrap();
        let mut eval_env = MockEnv::always_succeed();
        let mut sink = MemorySink::new();

        let outcome = trainer(None).run(&mut agent, &mut eval_env, &mut sink).unwrap();

        assert!(outcome.is_solved());
        assert_eq!(outcome.iterations(), 1);
        assert_eq!(sink.series("reward"), &[(1, 1.0)]);
        assert_eq!(agent.env().steps, 100, "One batch of random steps");
        assert_eq!(
            agent.transits().total(0, 0),
            120,
            "Random and evaluation steps are both recorded"
        );
    }

    #[test]
    fn iteration_cap_reports_not_converged() {
        let mut agent =
            QLearningAgent::new(MockEnv::always_fail(), QLearningAgentConfig::default()).unwrap();
        let mut eval_env = MockEnv::always_fail();
        let mut sink = MemorySink::new();

        let outcome = trainer(Some(5))
            .run(&mut agent, &mut eval_env, &mut sink)
            .unwrap();

        assert_eq!(
            outcome,
            TrainOutcome::NotConverged {
                iterations: 5,
                best_reward: 0.0
            }
        );
        assert_eq!(sink.series("reward").len(), 5);
        assert!(sink.is_closed());
    }

    #[test]
    fn best_reward_only_increases() {
        let mut agent = ScriptedAgent::new(&[0.1, 0.5, 0.3, 0.2]);
        let mut sink = MemorySink::new();

        let outcome = trainer(Some(4))
            .run(&mut agent, &mut MockEnv::always_fail(), &mut sink)
            .unwrap();

        assert_eq!(
            outcome,
            TrainOutcome::NotConverged {
                iterations: 4,
                best_reward: 0.5
            }
        );
        assert_eq!(agent.improved, 4);
        assert_eq!(
            sink.series("reward"),
            &[(1, 0.1), (2, 0.5), (3, 0.3), (4, 0.2)]
        );
    }

    #[test]
    fn solved_threshold_is_strict() {
        let mut agent = ScriptedAgent::new(&[0.8, 0.8, 0.81]);
        let outcome = trainer(Some(10))
            .run(&mut agent, &mut MockEnv::always_fail(), &mut MemorySink::new())
            .unwrap();

        assert_eq!(
            outcome,
            TrainOutcome::Solved {
                iterations: 3,
                reward: 0.81
            }
        );
    }

    #[test]
    fn cancel_flag_stops_before_next_iteration() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut agent = ScriptedAgent::new(&[0.0]);
        let mut sink = MemorySink::new();

        let outcome = trainer(None)
            .with_cancel_flag(Arc::clone(&flag))
            .run(&mut agent, &mut MockEnv::always_fail(), &mut sink)
            .unwrap();

        assert_eq!(
            outcome,
            TrainOutcome::Cancelled {
                iterations: 0,
                best_reward: 0.0
            }
        );
        assert_eq!(agent.improved, 0);
        assert!(sink.is_closed());
    }

    #[test]
    fn environment_failure_aborts_run() {
        let mut agent =
            QLearningAgent::new(MockEnv::always_fail(), QLearningAgentConfig::default()).unwrap();
        let mut eval_env = MockEnv::always_fail().failing_after(30);
        let mut sink = MemorySink::new();

        let result = trainer(None).run(&mut agent, &mut eval_env, &mut sink);

        assert!(matches!(result, Err(Error::Environment(_))));
        assert_eq!(sink.series("reward").len(), 1, "First iteration completed");
        assert!(!sink.is_closed());
    }
}
