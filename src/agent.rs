use crate::{env::Environment, Result};

/// The minimal contract shared by the training strategies
///
/// Each strategy gathers experience from its own training environment and is evaluated on a
/// separate environment instance passed in by the caller, so evaluation never disturbs the
/// training trajectory.
pub trait Agent<E: Environment> {
    /// Collect experience and update the value estimates
    fn improve(&mut self) -> Result<()>;

    /// Play one full greedy episode in `env`
    ///
    /// **Returns** the summed reward of the episode
    fn play_episode(&mut self, env: &mut E) -> Result<f32>;

    /// Play `episodes` greedy episodes in `env`
    ///
    /// **Returns** the average total reward
    fn evaluate(&mut self, env: &mut E, episodes: usize) -> Result<f32> {
        let mut reward = 0.0;
        for _ in 0..episodes {
            reward += self.play_episode(env)?;
        }
        Ok(reward / episodes as f32)
    }

    /// Run one collect, update, evaluate cycle
    ///
    /// **Returns** the average evaluation reward
    fn train_one_iteration(&mut self, env: &mut E, episodes: usize) -> Result<f32> {
        self.improve()?;
        self.evaluate(env, episodes)
    }
}
