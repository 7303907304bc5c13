use rand::{rngs::StdRng, Rng, SeedableRng};
use strum::{EnumIter, IntoEnumIterator};

use crate::{
    env::{DiscreteActionSpace, DiscreteStateSpace, Environment, Step},
    Error, Result,
};

/// The classic 4x4 lake
pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

/// The classic 8x8 lake
pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Square {
    Frozen,
    Hole,
    Start,
    Goal,
}

impl Square {
    fn parse(c: char) -> Option<Self> {
        match c {
            'F' => Some(Square::Frozen),
            'H' => Some(Square::Hole),
            'S' => Some(Square::Start),
            'G' => Some(Square::Goal),
            _ => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Square::Hole | Square::Goal)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter)]
pub enum FLAction {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl FLAction {
    /// The actions perpendicular to this one, in the order `[counterclockwise, clockwise]`
    fn perpendicular(self) -> [FLAction; 2] {
        match self {
            FLAction::Left => [FLAction::Up, FLAction::Down],
            FLAction::Down => [FLAction::Left, FLAction::Right],
            FLAction::Right => [FLAction::Down, FLAction::Up],
            FLAction::Up => [FLAction::Right, FLAction::Left],
        }
    }
}

/// A very simple RL environment taken from Python [gymnasium](https://gymnasium.farama.org/)
///
/// The agent walks a grid of frozen squares from `S` to `G` without falling into a hole `H`.
/// Reaching the goal pays `1.0`, every other step pays nothing, and the episode ends on a hole
/// or the goal. Moves into the border leave the agent in place.
///
/// When slippery (the default), the agent moves in the intended direction or in either
/// perpendicular direction with equal probability. Episodes are also cut off after a step
/// limit, 100 by default.
///
/// States are square indices in row-major order.
pub struct FrozenLake {
    map: Vec<Square>,
    ncol: usize,
    start: usize,
    pos: usize,
    slippery: bool,
    max_steps: Option<usize>,
    steps: usize,
    done: bool,
    rng: StdRng,
}

impl Default for FrozenLake {
    fn default() -> Self {
        Self::new()
    }
}

impl FrozenLake {
    /// The slippery 4x4 lake with a 100 step limit
    pub fn new() -> Self {
        Self::from_map(&MAP_4X4).expect("built-in map is valid")
    }

    /// The slippery 8x8 lake with a 100 step limit
    pub fn new_8x8() -> Self {
        Self::from_map(&MAP_8X8).expect("built-in map is valid")
    }

    /// Build a lake from rows of `S`, `F`, `H`, and `G` characters
    ///
    /// The map must be rectangular and contain exactly one start square.
    pub fn from_map(rows: &[&str]) -> Result<Self> {
        let ncol = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if ncol == 0 {
            return Err(Error::InvalidMap("map is empty".into()));
        }

        let mut map = Vec::with_capacity(rows.len() * ncol);
        for (i, row) in rows.iter().enumerate() {
            if row.chars().count() != ncol {
                return Err(Error::InvalidMap(format!(
                    "row {} has length {}, expected {}",
                    i,
                    row.chars().count(),
                    ncol
                )));
            }
            for c in row.chars() {
                let square = Square::parse(c)
                    .ok_or_else(|| Error::InvalidMap(format!("unknown square '{}'", c)))?;
                map.push(square);
            }
        }

        let mut starts = map.iter().enumerate().filter(|(_, s)| **s == Square::Start);
        let start = match (starts.next(), starts.next()) {
            (Some((i, _)), None) => i,
            _ => {
                return Err(Error::InvalidMap(
                    "map must have exactly one start square".into(),
                ))
            }
        };

        Ok(Self {
            map,
            ncol,
            start,
            pos: start,
            slippery: true,
            max_steps: Some(100),
            steps: 0,
            done: false,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn slippery(mut self, slippery: bool) -> Self {
        self.slippery = slippery;
        self
    }

    /// Cut episodes off after `max_steps` steps, or never with `None`
    pub fn max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Make the slippery dynamics reproducible
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn square(&self, state: usize) -> Option<Square> {
        self.map.get(state).copied()
    }

    fn nrow(&self) -> usize {
        self.map.len() / self.ncol
    }

    fn moved(&self, direction: FLAction) -> usize {
        let (row, col) = (self.pos / self.ncol, self.pos % self.ncol);
        let (row, col) = match direction {
            FLAction::Left => (row, col.saturating_sub(1)),
            FLAction::Down => ((row + 1).min(self.nrow() - 1), col),
            FLAction::Right => (row, (col + 1).min(self.ncol - 1)),
            FLAction::Up => (row.saturating_sub(1), col),
        };
        row * self.ncol + col
    }
}

impl Environment for FrozenLake {
    type State = usize;
    type Action = FLAction;

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>> {
        if self.done {
            return Err(Error::EpisodeFinished);
        }

        let direction = if self.slippery {
            let [ccw, cw] = action.perpendicular();
            [ccw, action, cw][self.rng.gen_range(0..3)]
        } else {
            action
        };

        self.pos = self.moved(direction);
        self.steps += 1;

        let square = self.map[self.pos];
        let reward = if square == Square::Goal { 1.0 } else { 0.0 };
        let truncated = self.max_steps.is_some_and(|max| self.steps >= max);
        self.done = square.is_terminal() || truncated;

        Ok(Step {
            next_state: self.pos,
            reward,
            done: self.done,
        })
    }

    fn reset(&mut self) -> Result<Self::State> {
        self.pos = self.start;
        self.steps = 0;
        self.done = false;
        Ok(self.pos)
    }
}

impl DiscreteActionSpace for FrozenLake {
    fn actions(&self) -> Vec<Self::Action> {
        FLAction::iter().collect()
    }
}

impl DiscreteStateSpace for FrozenLake {
    fn states(&self) -> Vec<Self::State> {
        (0..self.map.len()).collect()
    }
}
